mod cli;
mod telemetry;

use anyhow::Context;
use cli::{Cli, Command};
use myhammer::prelude::*;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_or_exit();
    telemetry::init();

    match cli.command {
        Command::Clean(args) => {
            let store = MySqlStore::new(args.into());
            store
                .reset_schema()
                .await
                .context("Unable to clean the myhammer schema")?;
            info!("Schema removed");
        }
        Command::Run(args) => {
            let config = args.hammer_config()?;
            let store = MySqlStore::new(args.connection.into());
            let stats = Hammer::with_config(store, config).run().await?;

            info!("{stats}");
            println!("Program exited. Max key = {}", stats.max_key);
        }
    }

    Ok(())
}
