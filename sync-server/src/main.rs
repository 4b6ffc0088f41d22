use sync_server::{Config, Server, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logger();

    let config = Config::from_env();
    tracing::info!(environment = %config.environment, "Megamarket sync server starting");

    Server::new(config).run().await
}
