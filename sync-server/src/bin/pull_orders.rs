//! On-demand pull of new marketplace orders
//!
//! Lists `NEW` shipments of the trailing day for every active profile and
//! runs each unseen one through the translator, printing one line per
//! shipment. Exit code 1 when any translation fails.

use shared::market::local_order_number;
use shared::message::OrderIntakeCommand;
use sync_server::{Config, ServerState, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logger();

    let config = Config::from_env();
    let window = chrono::Duration::hours(config.intake_window_hours as i64);
    let (state, _commands, _changes) = ServerState::initialize(config)?;
    let translator = state.translator();

    let mut failed = false;
    for profile in state.profiles.active_profiles().await {
        for order in state.client.list_new_orders(&profile, window).await {
            let number = local_order_number(&order.shipment_id);
            if state.orders.exists_by_number(&number).await {
                println!("{number}: already known");
                continue;
            }

            let command = OrderIntakeCommand::new(&order.shipment_id, profile);
            match translator.translate(&command).await {
                Ok(Some(_)) => println!("{number}: added"),
                Ok(None) => println!("{number}: already known"),
                Err(e) => {
                    eprintln!("{number}: failed ({e})");
                    failed = true;
                }
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
