use url::form_urlencoded;

use crate::payslip::money::{format_amount, parse_numeric_str};
use crate::payslip::{value_to_text, LineItem, PayslipRecord, PayslipSummary};

use super::template::{escape_html, Template};

/// What goes in the `{{downloadButton}}` slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadButton {
    /// HTML view: link to the PDF download for the same employee and month
    Link { employee: String, month: String },
    /// PDF view: a clickable button is meaningless on paper
    Hidden,
}

impl DownloadButton {
    fn to_html(&self) -> String {
        match self {
            DownloadButton::Hidden => String::new(),
            DownloadButton::Link { employee, month } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("u", employee)
                    .append_pair("month", month)
                    .finish();
                format!(
                    r#"<div class="download-button"><a href="/ppdf/pdf?{}" target="_blank">📄 PDFとしてダウンロード</a></div>"#,
                    escape_html(&query)
                )
            }
        }
    }
}

/// Fill the payslip template from a record and its aggregated summary.
///
/// `fallback_name` is used when the payslip row carries no name of its own.
pub fn render_payslip(
    template: &Template,
    record: &PayslipRecord,
    summary: &PayslipSummary,
    fallback_name: &str,
    button: &DownloadButton,
) -> String {
    let name = record.name.as_deref().unwrap_or(fallback_name);

    let bindings = [
        ("name", escape_html(name)),
        ("month", escape_html(&record.month)),
        ("daysWorked", scalar_text(record.days_worked.as_ref())),
        ("workHours", scalar_text(record.work_hours.as_ref())),
        ("overtimeH", scalar_text(record.overtime_hours.as_ref())),
        ("netPay", net_pay_text(record.net_pay.as_ref())),
        ("allowanceHtml", rows_html(&summary.allowances)),
        ("deductionHtml", rows_html(&summary.deductions)),
        ("totalAllowance", format_amount(summary.total_allowance)),
        ("totalDeduction", format_amount(summary.total_deduction)),
        ("downloadButton", button.to_html()),
    ];

    template.render(&bindings)
}

fn rows_html(items: &[LineItem]) -> String {
    items
        .iter()
        .map(|item| format!("<tr><th>{}</th><td>{}</td></tr>", escape_html(&item.label), item.formatted))
        .collect()
}

fn scalar_text(value: Option<&serde_json::Value>) -> String {
    value.and_then(value_to_text).map(|s| escape_html(&s)).unwrap_or_default()
}

/// Net pay is shown grouped; an unparsable value is shown as-is
fn net_pay_text(value: Option<&serde_json::Value>) -> String {
    let Some(text) = value.and_then(value_to_text) else {
        return String::new();
    };
    match parse_numeric_str(&text) {
        Some(amount) => format_amount(amount),
        None => escape_html(&text),
    }
}
