pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "payslip-admin")]
#[command(about = "Payslip admin CLI - payroll import and data maintenance")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Convert a payroll CSV export into payslips.json and display-names.json")]
    Import(commands::import::ImportArgs),

    #[command(about = "List every month with payslip data")]
    Months(commands::months::MonthsArgs),

    #[command(about = "Apply the Postgres schema")]
    Migrate(commands::migrate::MigrateArgs),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Import(args) => commands::import::handle(args, output_format).await,
        Commands::Months(args) => commands::months::handle(args, output_format).await,
        Commands::Migrate(args) => commands::migrate::handle(args, output_format).await,
    }
}
