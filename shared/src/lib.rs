//! Shared types for the Megamarket order synchronization service
//!
//! - [`error`]: unified error system ([`AppError`], [`ErrorCode`], [`AppResult`])
//! - [`response`]: API response envelopes (internal + marketplace-facing)
//! - [`order`]: internal order snapshot types and identifiers
//! - [`market`]: remote (marketplace) order model and acknowledgement payloads
//! - [`message`]: commands carried by the sync command bus

pub mod error;
pub mod market;
pub mod message;
pub mod order;
pub mod response;

pub use error::{AppError, AppResult, ErrorCode};
pub use response::{ApiResponse, MarketReply};
