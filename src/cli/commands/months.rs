use clap::Args;
use serde_json::{json, Map, Value};
use std::path::PathBuf;

use crate::cli::utils::{output_empty_collection, output_list};
use crate::cli::OutputFormat;
use crate::store::file::{all_months, PAYSLIPS_FILE};

#[derive(Args, Debug)]
pub struct MonthsArgs {
    #[arg(long, default_value = "data", help = "Directory containing payslips.json")]
    pub data_dir: PathBuf,
}

/// Every month that has payslip data for anyone, sorted
pub async fn handle(args: MonthsArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let path = args.data_dir.join(PAYSLIPS_FILE);
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| anyhow::anyhow!("No payslip data at {}: {}", path.display(), e))?;
    let payslips: Map<String, Value> = serde_json::from_str(&raw)?;

    let months = all_months(&payslips);
    if months.is_empty() {
        return output_empty_collection(&output_format, "months", "No months found");
    }

    output_list(&output_format, "months", &json!(months), &months)
}
