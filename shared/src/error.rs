//! Unified error system
//!
//! Provides:
//! - [`ErrorCode`]: standardized error codes for all error types
//! - [`AppError`]: rich error type with codes, messages, and details
//! - [`AppResult`]: result alias used throughout the workspace
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Product errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::validation("items must not be empty");
//! assert_eq!(err.code, ErrorCode::ValidationFailed);
//! ```

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::response::ApiResponse;

/// Standardized error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Success (placeholder, never carried by an error)
    Success,
    /// Input validation failed
    ValidationFailed,
    /// Malformed or unparseable request
    InvalidRequest,
    /// Resource not found
    NotFound,
    /// Resource already exists
    AlreadyExists,
    /// Order not found
    OrderNotFound,
    /// Order number already registered
    OrderNumberExists,
    /// Order creation rejected
    OrderCreateFailed,
    /// Product article unknown to the catalog
    ProductNotFound,
    /// Remote marketplace reported a business error
    MarketError,
    /// Transport-level failure (connection, DNS, TLS)
    NetworkError,
    /// Request timed out
    TimeoutError,
    /// Configuration error
    ConfigError,
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Numeric code, stable across releases
    pub fn code(&self) -> u16 {
        match self {
            Self::Success => 0,
            Self::ValidationFailed => 1,
            Self::InvalidRequest => 2,
            Self::NotFound => 3,
            Self::AlreadyExists => 4,
            Self::OrderNotFound => 4001,
            Self::OrderNumberExists => 4002,
            Self::OrderCreateFailed => 4003,
            Self::ProductNotFound => 6001,
            Self::MarketError => 9001,
            Self::NetworkError => 9002,
            Self::TimeoutError => 9003,
            Self::ConfigError => 9004,
            Self::InternalError => 9005,
        }
    }

    /// Wire representation, e.g. `E4001`
    pub fn as_str(&self) -> String {
        format!("E{:04}", self.code())
    }

    /// Default human-readable message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::ValidationFailed => "Validation failed",
            Self::InvalidRequest => "Invalid request",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::OrderNotFound => "Order not found",
            Self::OrderNumberExists => "Order number already exists",
            Self::OrderCreateFailed => "Order creation failed",
            Self::ProductNotFound => "Product not found",
            Self::MarketError => "Marketplace reported an error",
            Self::NetworkError => "Network error",
            Self::TimeoutError => "Request timed out",
            Self::ConfigError => "Configuration error",
            Self::InternalError => "Internal server error",
        }
    }

    /// HTTP status code mapping
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,
            Self::NotFound | Self::OrderNotFound | Self::ProductNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists | Self::OrderNumberExists => StatusCode::CONFLICT,
            Self::NetworkError | Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,
            Self::MarketError | Self::OrderCreateFailed => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ConfigError | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationFailed | Self::InvalidRequest => StatusCode::BAD_REQUEST,
        }
    }
}

/// Application error with structured error code and details
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NetworkError, msg)
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ConfigError, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();

        // Server-side failures are logged; client mistakes are not
        if status.is_server_error() {
            tracing::error!(
                code = self.code.as_str(),
                message = %self.message,
                "Request failed with a server error"
            );
        }

        let body = ApiResponse::<()>::error(self.code.as_str(), self.message);
        (status, Json(body)).into_response()
    }
}

/// Result alias used throughout the workspace
pub type AppResult<T> = Result<T, AppError>;
