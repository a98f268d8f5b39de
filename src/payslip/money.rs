use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Currency glyph prefixed to every line-item amount
pub const CURRENCY: &str = "¥";

/// Fraction digits kept when a value is not integral
const MAX_FRACTION_DIGITS: u32 = 3;

/// Parse a stored money value, stripping grouping commas first.
///
/// Returns `None` for anything that should not be counted: zero, empty
/// strings, non-numeric strings, booleans, null and nested values.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    let amount = match value {
        Value::Number(n) => parse_numeric_str(&n.to_string())?,
        Value::String(s) => parse_numeric_str(s)?,
        _ => return None,
    };

    if amount.is_zero() {
        None
    } else {
        Some(amount)
    }
}

/// Strict numeric parse of a possibly comma-grouped string
pub fn parse_numeric_str(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let numeric = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E');
    if cleaned.is_empty() || !cleaned.chars().all(numeric) {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Group thousands with commas: `27500` → `27,500`, `-1234.5` → `-1,234.5`
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(MAX_FRACTION_DIGITS).normalize();
    let text = rounded.abs().to_string();

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 2);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Amount with the currency glyph, as shown in line items
pub fn format_currency(amount: Decimal) -> String {
    format!("{}{}", CURRENCY, format_amount(amount))
}
