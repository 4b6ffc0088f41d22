//! Logging setup

use tracing_subscriber::EnvFilter;

/// Initialize structured logging; `RUST_LOG` overrides the default level
pub fn init_logger() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}
