use rust_decimal::Decimal;
use tracing::warn;

use super::money::{format_currency, parse_amount};
use super::{CompensationKind, DisplayNameMap, PayslipRecord};

/// A single allowance or deduction row on the payslip
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub key: String,
    pub label: String,
    pub amount: Decimal,
    /// `¥5,000`
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PayslipSummary {
    pub allowances: Vec<LineItem>,
    pub deductions: Vec<LineItem>,
    pub total_allowance: Decimal,
    pub total_deduction: Decimal,
}

/// Split a payslip's money fields into allowance and deduction rows and total
/// them. Values that are zero, empty or not numeric are left out of both the
/// rows and the totals, as is any value that would overflow its total; this
/// never fails.
pub fn aggregate(record: &PayslipRecord, display_names: &DisplayNameMap) -> PayslipSummary {
    let mut summary = PayslipSummary::default();

    for component in &record.components {
        let Some(amount) = parse_amount(&component.value) else {
            continue;
        };

        let total = match component.kind {
            CompensationKind::Allowance => &mut summary.total_allowance,
            CompensationKind::Deduction => &mut summary.total_deduction,
        };
        let Some(sum) = total.checked_add(amount) else {
            warn!("Dropping {} from payslip {}: total would overflow", component.key, record.month);
            continue;
        };
        *total = sum;

        let item = LineItem {
            key: component.key.clone(),
            label: display_names.label(&component.key).to_string(),
            amount,
            formatted: format_currency(amount),
        };

        match component.kind {
            CompensationKind::Allowance => summary.allowances.push(item),
            CompensationKind::Deduction => summary.deductions.push(item),
        }
    }

    summary
}
