use clap::{Parser, Subcommand};
use hearth_app::config::LoggingConfig;

mod db;
mod loyalty;

#[derive(Debug, Parser)]
#[command(name = "hearth-app", about = "Hearth CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Loyalty(loyalty::LoyaltyCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Loyalty(command) => loyalty::run(command).await,
        }
    }
}
