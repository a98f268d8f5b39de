use clap::Args;
use encoding_rs::Encoding;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Map, Number, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::payslip::money::parse_numeric_str;
use crate::store::file::{DISPLAY_NAMES_FILE, PAYSLIPS_FILE};

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[arg(long, help = "Payroll CSV export (row 1: labels, row 2: field keys)")]
    pub csv: PathBuf,

    #[arg(long, default_value = "data", help = "Directory to write payslips.json and display-names.json")]
    pub out: PathBuf,

    #[arg(long, default_value = "shift_jis", help = "Text encoding of the CSV file")]
    pub encoding: String,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("CSV needs a label row and a key row before the data")]
    MissingHeader,

    #[error("No userId column in the key row")]
    MissingUserIdColumn,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result of converting one export
#[derive(Debug, Default)]
pub struct Converted {
    /// subject id -> records, in file order
    pub payslips: Map<String, Value>,
    /// field key -> label
    pub display_names: Map<String, Value>,
    pub skipped_rows: usize,
}

impl Converted {
    pub fn record_count(&self) -> usize {
        self.payslips
            .values()
            .filter_map(Value::as_array)
            .map(Vec::len)
            .sum()
    }
}

/// Columns that identify a row rather than carry an amount; kept as text
const TEXT_COLUMNS: &[&str] = &["userid", "month", "name"];

/// Decode raw bytes with a WHATWG encoding label such as `shift_jis`
pub fn decode(bytes: &[u8], label: &str) -> Result<String, ImportError> {
    let encoding =
        Encoding::for_label(label.as_bytes()).ok_or_else(|| ImportError::UnknownEncoding(label.to_string()))?;
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!("Some bytes were not valid {}; replaced with U+FFFD", encoding.name());
    }
    Ok(text.into_owned())
}

/// Turn decoded CSV text into payslip records and display names
pub fn convert(text: &str) -> Result<Converted, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = reader.records();

    let labels = rows.next().ok_or(ImportError::MissingHeader)??;
    let keys: Vec<String> = rows
        .next()
        .ok_or(ImportError::MissingHeader)??
        .iter()
        .map(|k| k.trim().to_string())
        .collect();

    let user_id_col = keys
        .iter()
        .position(|k| k.eq_ignore_ascii_case("userid"))
        .ok_or(ImportError::MissingUserIdColumn)?;

    let mut converted = Converted::default();
    for (key, label) in keys.iter().zip(labels.iter()) {
        let label = label.trim();
        if !key.is_empty() && !label.is_empty() {
            converted.display_names.insert(key.clone(), Value::String(label.to_string()));
        }
    }

    for (index, row) in rows.enumerate() {
        let row = row?;
        let Some(user_id) = row.get(user_id_col).map(str::trim).filter(|id| !id.is_empty()) else {
            // +3: two header rows, one-based
            warn!("Skipping row {} without userId", index + 3);
            converted.skipped_rows += 1;
            continue;
        };

        let mut record = Map::new();
        for (key, raw) in keys.iter().zip(row.iter()) {
            if key.is_empty() || raw.is_empty() {
                continue;
            }
            record.insert(key.clone(), cell_value(key, raw));
        }

        debug!("Imported row for {}", user_id);
        if let Some(records) = converted
            .payslips
            .entry(user_id.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
        {
            records.push(Value::Object(record));
        }
    }

    Ok(converted)
}

/// Numbers (commas allowed) become JSON numbers; everything else stays text
fn cell_value(key: &str, raw: &str) -> Value {
    if TEXT_COLUMNS.contains(&key.to_ascii_lowercase().as_str()) {
        return Value::String(raw.trim().to_string());
    }
    parse_numeric_str(raw)
        .and_then(decimal_to_number)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

fn decimal_to_number(amount: Decimal) -> Option<Number> {
    if amount.fract().is_zero() {
        amount.to_i64().map(Number::from)
    } else {
        amount.to_f64().and_then(Number::from_f64)
    }
}

async fn write_json(path: &Path, value: &Map<String, Value>) -> Result<(), ImportError> {
    let body = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

pub async fn handle(args: ImportArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&args.csv).await?;
    let text = decode(&bytes, &args.encoding)?;
    let converted = convert(&text)?;

    tokio::fs::create_dir_all(&args.out).await?;
    let payslips_path = args.out.join(PAYSLIPS_FILE);
    let display_names_path = args.out.join(DISPLAY_NAMES_FILE);
    write_json(&payslips_path, &converted.payslips).await?;
    write_json(&display_names_path, &converted.display_names).await?;

    output_success(
        &output_format,
        &format!(
            "Wrote {} and {}",
            payslips_path.display(),
            display_names_path.display()
        ),
        Some(json!({
            "employees": converted.payslips.len(),
            "records": converted.record_count(),
            "display_names": converted.display_names.len(),
            "skipped_rows": converted.skipped_rows,
        })),
    )
}
