//! Inbound HTTP surface
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /health | GET | Liveness check |
//! | /megamarket/order/new/{profile} | POST | Shipment-creation webhook |
//! | /megamarket/order/cancel/{profile} | POST | Cancellation webhook (acknowledged only) |

pub mod megamarket;

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/health", get(health))
        .merge(megamarket::router())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
