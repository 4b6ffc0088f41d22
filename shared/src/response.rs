//! API response types
//!
//! Two envelope families live here:
//!
//! - [`ApiResponse`]: the internal `{code, message, data}` envelope used by
//!   service endpoints and error responses.
//! - [`MarketReply`]: the `{data, meta, success}` envelope the marketplace
//!   expects from webhook endpoints. Webhooks always answer immediately with
//!   a syntactically valid envelope; real processing is asynchronous.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard API response code
pub const API_CODE_SUCCESS: &str = "E0000";

/// Unified internal API response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (E0000 = success, others = error codes)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Response data (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn ok(data: T) -> Self {
        Self {
            code: API_CODE_SUCCESS.to_string(),
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    /// Create an error response
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }
}

/// Marketplace-facing webhook reply: `{"data":{},"meta":{},"success":1}`
#[derive(Debug, Serialize, Deserialize)]
pub struct MarketReply {
    pub data: Value,
    pub meta: Value,
    pub success: u8,
}

impl MarketReply {
    /// Acknowledged reply (`success: 1`)
    pub fn ok() -> Self {
        Self {
            data: Value::Object(Default::default()),
            meta: Value::Object(Default::default()),
            success: 1,
        }
    }

    /// Rejected reply (`success: 0`), e.g. unresolvable profile
    pub fn fail() -> Self {
        Self {
            data: Value::Object(Default::default()),
            meta: Value::Object(Default::default()),
            success: 0,
        }
    }
}
