use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use super::{distinct_months, Employee, NewEmployee, PayrollStore, StoreError};
use crate::payslip::PayslipRecord;

pub const EMPLOYEES_FILE: &str = "employees.csv";
pub const PAYSLIPS_FILE: &str = "payslips.json";
pub const DISPLAY_NAMES_FILE: &str = "display-names.json";

const EMPLOYEES_HEADER: &str = "userId,name,shop,uuid";

/// Flat-file store: `employees.csv` plus the imported `payslips.json`.
///
/// Files are read whole on every call. Registration holds `write_lock`
/// across the duplicate check and the append, which is what makes
/// `line_user_id` unique for this backend.
pub struct FileStore {
    employees_path: PathBuf,
    payslips_path: PathBuf,
    write_lock: Mutex<()>,
}

/// Column positions resolved from the CSV header
#[derive(Debug, Clone, Copy)]
struct EmployeeColumns {
    /// Number of fields in the header
    width: usize,
    user_id: usize,
    name: usize,
    shop: usize,
    uuid: Option<usize>,
}

impl EmployeeColumns {
    fn from_header(header: &str) -> Self {
        let names: Vec<String> = header.split(',').map(|h| h.trim().to_ascii_lowercase()).collect();
        let find = |candidates: &[&str]| names.iter().position(|n| candidates.contains(&n.as_str()));

        Self {
            width: names.len(),
            user_id: find(&["userid", "line_user_id"]).unwrap_or(0),
            name: find(&["name"]).unwrap_or(1),
            shop: find(&["shop", "department"]).unwrap_or(2),
            uuid: find(&["uuid"]),
        }
    }

    /// Lay out an employee row to match the header. Fails when two of the
    /// fields would land in the same column.
    fn row(&self, employee: &Employee) -> Result<String, StoreError> {
        let uuid = employee.uuid.to_string();
        let mut placed = vec![
            (self.user_id, employee.line_user_id.as_str()),
            (self.name, employee.name.as_str()),
            (self.shop, employee.shop.as_str()),
        ];
        if let Some(index) = self.uuid {
            placed.push((index, uuid.as_str()));
        }

        let width = placed.iter().map(|(i, _)| i + 1).max().unwrap_or(0).max(self.width);
        let mut cells: Vec<Option<&str>> = vec![None; width];
        for (index, value) in placed {
            if cells[index].replace(value).is_some() {
                return Err(StoreError::InvalidRecord(format!(
                    "{} header has overlapping columns",
                    EMPLOYEES_FILE
                )));
            }
        }
        Ok(cells.into_iter().map(Option::unwrap_or_default).collect::<Vec<_>>().join(","))
    }
}

impl FileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            employees_path: data_dir.join(EMPLOYEES_FILE),
            payslips_path: data_dir.join(PAYSLIPS_FILE),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_employees(&self) -> Result<Vec<Employee>, StoreError> {
        let raw = Self::read_optional(&self.employees_path).await?;
        Ok(raw.as_deref().map(parse_employees).unwrap_or_default())
    }

    /// The payslip entry for one subject: a single record or an array
    async fn load_entry(&self, line_user_id: &str) -> Result<Option<Value>, StoreError> {
        let Some(raw) = Self::read_optional(&self.payslips_path).await? else {
            return Ok(None);
        };
        let mut all: Map<String, Value> = serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            path: self.payslips_path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(all.remove(line_user_id))
    }
}

fn parse_employees(raw: &str) -> Vec<Employee> {
    let mut lines = raw.lines();
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let columns = EmployeeColumns::from_header(header);

    lines
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let line_user_id = fields.get(columns.user_id).copied().filter(|id| !id.is_empty())?;
            let uuid = columns
                .uuid
                .and_then(|i| fields.get(i))
                .and_then(|u| Uuid::parse_str(u).ok())
                .unwrap_or_else(|| Employee::derived_uuid(line_user_id));

            Some(Employee {
                uuid,
                line_user_id: line_user_id.to_string(),
                name: fields.get(columns.name).copied().unwrap_or_default().to_string(),
                shop: fields.get(columns.shop).copied().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// The CSV has no quoting, so separators inside a field would shift columns
fn check_field(field: &str, value: &str) -> Result<(), StoreError> {
    if value.contains([',', '\n', '\r']) {
        return Err(StoreError::InvalidRecord(format!("{} must not contain commas or line breaks", field)));
    }
    Ok(())
}

fn records_in(entry: &Value) -> Vec<PayslipRecord> {
    match entry {
        Value::Array(items) => items.iter().filter_map(PayslipRecord::from_value).collect(),
        other => PayslipRecord::from_value(other).into_iter().collect(),
    }
}

#[async_trait]
impl PayrollStore for FileStore {
    async fn find_employee_by_subject(&self, line_user_id: &str) -> Result<Option<Employee>, StoreError> {
        Ok(self
            .load_employees()
            .await?
            .into_iter()
            .find(|e| e.line_user_id == line_user_id))
    }

    async fn find_employee_by_uuid(&self, uuid: Uuid) -> Result<Option<Employee>, StoreError> {
        Ok(self.load_employees().await?.into_iter().find(|e| e.uuid == uuid))
    }

    async fn register_employee(&self, new: NewEmployee) -> Result<Employee, StoreError> {
        check_field("userId", &new.line_user_id)?;
        check_field("name", &new.name)?;
        check_field("shop", &new.shop)?;

        let _guard = self.write_lock.lock().await;

        let existing = Self::read_optional(&self.employees_path).await?;
        let employees = existing.as_deref().map(parse_employees).unwrap_or_default();
        if employees.iter().any(|e| e.line_user_id == new.line_user_id) {
            return Err(StoreError::AlreadyRegistered(new.line_user_id));
        }

        let employee = Employee {
            uuid: Employee::derived_uuid(&new.line_user_id),
            line_user_id: new.line_user_id,
            name: new.name,
            shop: new.shop,
        };

        let mut text = String::new();
        let columns = match existing.as_deref().filter(|raw| !raw.is_empty()) {
            Some(raw) => {
                if !raw.ends_with('\n') {
                    text.push('\n');
                }
                EmployeeColumns::from_header(raw.lines().next().unwrap_or_default())
            }
            None => {
                text.push_str(EMPLOYEES_HEADER);
                text.push('\n');
                EmployeeColumns::from_header(EMPLOYEES_HEADER)
            }
        };
        text.push_str(&columns.row(&employee)?);
        text.push('\n');

        if let Some(parent) = self.employees_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.employees_path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;

        info!("Registered employee {} ({})", employee.uuid, employee.shop);
        Ok(employee)
    }

    async fn list_months(&self, employee: &Employee) -> Result<Vec<String>, StoreError> {
        let months = match self.load_entry(&employee.line_user_id).await? {
            Some(entry) => records_in(&entry).into_iter().map(|r| r.month).collect(),
            None => Vec::new(),
        };
        Ok(distinct_months(months))
    }

    async fn find_payslip(&self, employee: &Employee, month: &str) -> Result<Option<PayslipRecord>, StoreError> {
        let Some(entry) = self.load_entry(&employee.line_user_id).await? else {
            return Ok(None);
        };
        Ok(records_in(&entry).into_iter().find(|r| r.month == month))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.employees_path.parent() {
            tokio::fs::metadata(dir).await?;
        }
        Ok(())
    }
}

/// Month strings across every subject in a payslips file, sorted
pub fn all_months(payslips: &Map<String, Value>) -> Vec<String> {
    let months = payslips
        .values()
        .flat_map(records_in)
        .map(|r| r.month)
        .collect();
    distinct_months(months)
}
