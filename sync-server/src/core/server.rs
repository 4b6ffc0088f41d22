//! Server startup and task supervision

use std::net::SocketAddr;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::core::{Config, ServerState};

pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build state, spawn the pipeline tasks and serve until Ctrl-C
    pub async fn run(&self) -> anyhow::Result<()> {
        let (state, commands, changes) =
            ServerState::initialize(self.config.clone()).context("state initialization failed")?;

        let cancel = CancellationToken::new();

        tokio::spawn(state.consumer().run(commands, cancel.clone()));
        tokio::spawn(state.order_changed_listener().run(changes, cancel.clone()));
        tokio::spawn(state.intake().run(cancel.clone()));

        let app = api::router()
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("Megamarket sync server starting on {addr}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        let shutdown = {
            let cancel = cancel.clone();
            async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
                cancel.cancel();
            }
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")?;

        Ok(())
    }
}
