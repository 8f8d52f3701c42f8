use anyhow::Context;
use clap::Subcommand;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config;
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply pending migrations")]
    Migrate,

    #[command(about = "Check that the database answers")]
    Ping,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("connecting to database")?;

    match cmd {
        DbCommands::Migrate => {
            DatabaseManager::migrate(&pool).await.context("running migrations")?;
            output_success(output_format, "Migrations applied", None)
        }
        DbCommands::Ping => {
            DatabaseManager::health_check(&pool).await.context("database ping")?;
            output_success(output_format, "Database is reachable", None)
        }
    }
}
