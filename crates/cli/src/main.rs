//! SmartHVAC storefront CLI
//!
//! Browse the catalog, manage the persisted cart and run the simulated checkout from a
//! terminal. State lives in a data directory, one JSON document per storage key.

use std::process;

use clap::Parser;

use crate::{
    commands::Commands,
    config::{logging::LoggingConfig, storage::StorageConfig},
};

mod commands;
mod config;
mod logging;
mod shutdown;

#[derive(Debug, Parser)]
#[command(name = "smarthvac", about = "SmartHVAC storefront", long_about = None)]
struct Cli {
    #[command(flatten)]
    storage: StorageConfig,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Load configuration from `.env`, the environment and CLI arguments
    fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    async fn run(self) -> Result<(), String> {
        logging::init_subscriber(&self.logging).map_err(|error| format!("{error}"))?;

        self.command.run(&self.storage).await
    }
}

#[tokio::main(flavor = "current_thread")]
pub async fn main() {
    let cli = Cli::load().unwrap_or_else(|error| error.exit());

    if let Err(error) = cli.run().await {
        #[expect(
            clippy::print_stderr,
            reason = "command errors are reported to the user on stderr"
        )]
        {
            eprintln!("error: {error}");
        }

        process::exit(1);
    }
}
