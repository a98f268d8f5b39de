pub mod aggregate;
pub mod display_names;
pub mod money;

pub use aggregate::{aggregate, LineItem, PayslipSummary};
pub use display_names::DisplayNameMap;

use serde_json::{Map, Value};

/// Which running total a compensation field contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompensationKind {
    Allowance,
    Deduction,
}

impl CompensationKind {
    pub const ALLOWANCE_PREFIX: &'static str = "allowance_";
    pub const DEDUCTION_PREFIX: &'static str = "deduction_";

    /// Classify a field key by prefix; anything else is not a money component
    pub fn classify(key: &str) -> Option<Self> {
        if key.starts_with(Self::ALLOWANCE_PREFIX) {
            Some(CompensationKind::Allowance)
        } else if key.starts_with(Self::DEDUCTION_PREFIX) {
            Some(CompensationKind::Deduction)
        } else {
            None
        }
    }
}

/// One keyed money field as it was stored, before any parsing
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub kind: CompensationKind,
    pub key: String,
    pub value: Value,
}

/// One month's payslip for one employee.
///
/// Scalars are pulled out into fields; `allowance_*` / `deduction_*`
/// fields are kept as components in the order the record listed them, so
/// keys added by the import pipeline flow through without code changes.
#[derive(Debug, Clone, PartialEq)]
pub struct PayslipRecord {
    pub name: Option<String>,
    pub month: String,
    pub days_worked: Option<Value>,
    pub work_hours: Option<Value>,
    pub overtime_hours: Option<Value>,
    pub net_pay: Option<Value>,
    pub components: Vec<Component>,
}

impl PayslipRecord {
    /// Build from a JSON object (file store entry or `row_to_json` row).
    /// Returns `None` when the object has no month.
    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        let month = map.get("month").and_then(value_to_text).filter(|m| !m.is_empty())?;

        let pick = |keys: &[&str]| -> Option<Value> {
            keys.iter()
                .filter_map(|k| map.get(*k))
                .find(|v| !v.is_null())
                .cloned()
        };

        let components = map
            .iter()
            .filter_map(|(key, value)| {
                CompensationKind::classify(key).map(|kind| Component {
                    kind,
                    key: key.clone(),
                    value: value.clone(),
                })
            })
            .collect();

        Some(Self {
            name: pick(&["name"]).as_ref().and_then(value_to_text),
            month,
            days_worked: pick(&["daysWorked", "days_worked"]),
            work_hours: pick(&["workHours", "work_hours"]),
            overtime_hours: pick(&["overtimeH", "overtime_h", "overtime_hours"]),
            net_pay: pick(&["netPay", "net_pay"]),
            components,
        })
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().and_then(Self::from_map)
    }
}

/// String form of a scalar JSON value; numbers keep their JSON spelling
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
