use clap::Args;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::StoreConfig;
use crate::store::PgStore;

#[derive(Args, Debug)]
pub struct MigrateArgs {
    #[arg(long, env = "DATABASE_URL", help = "Postgres connection string")]
    pub database_url: String,
}

/// Create the employees/salaries tables if they do not exist
pub async fn handle(args: MigrateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut config = crate::config::AppConfig::from_env().store;
    config.database_url = Some(args.database_url);
    let config = StoreConfig { max_connections: 1, ..config };

    let store = PgStore::connect(&config).await?;
    store.migrate().await?;

    output_success(
        &output_format,
        "Schema applied",
        Some(json!({ "tables": ["employees", "salaries"] })),
    )
}
