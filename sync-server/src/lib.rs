//! Megamarket order-status synchronization service
//!
//! Keeps local orders and the Megamarket marketplace in step, in both
//! directions:
//!
//! - **Inbound**: new remote shipments become local orders, discovered by
//!   a polling intake task and by the marketplace's webhooks.
//! - **Outbound**: local status transitions (`New` → ready for packaging,
//!   `Completed` → handed over) are acknowledged back to the marketplace.
//!
//! # Module structure
//!
//! ```text
//! sync-server/src/
//! ├── core/          # Configuration, state, server
//! ├── client/        # Marketplace HTTP client
//! ├── bus/           # In-process command bus
//! ├── sync/          # Intake, translation, dispatchers, workers
//! ├── api/           # Webhook endpoints
//! ├── services/      # Collaborator traits + in-memory implementations
//! └── utils/         # Logging setup
//! ```

pub mod api;
pub mod bus;
pub mod client;
pub mod core;
pub mod services;
pub mod sync;
pub mod utils;

pub use core::{Config, Server, ServerState};
pub use utils::init_logger;
