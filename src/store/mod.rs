pub mod file;
pub mod postgres;

pub use file::FileStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::payslip::PayslipRecord;

/// Namespace for deriving stable uuids for employees stored without one
pub const EMPLOYEE_NAMESPACE: Uuid = Uuid::from_u128(0x5d8e_41f2_0c6b_4f0a_9a43_7e21_b6c4_d390);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub uuid: Uuid,
    /// External OAuth subject id (LINE user id, or `google:<sub>`)
    pub line_user_id: String,
    pub name: String,
    pub shop: String,
}

impl Employee {
    pub fn derived_uuid(line_user_id: &str) -> Uuid {
        Uuid::new_v5(&EMPLOYEE_NAMESPACE, line_user_id.as_bytes())
    }
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub line_user_id: String,
    pub name: String,
    pub shop: String,
}

/// Errors from PayrollStore implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Employee already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Corrupt data file {path}: {message}")]
    Corrupt { path: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Read side for employees and payslips plus the one write the web tier
/// performs (registration).
#[async_trait]
pub trait PayrollStore: Send + Sync {
    async fn find_employee_by_subject(&self, line_user_id: &str) -> Result<Option<Employee>, StoreError>;

    async fn find_employee_by_uuid(&self, uuid: Uuid) -> Result<Option<Employee>, StoreError>;

    /// Insert a new employee. Uniqueness of `line_user_id` is enforced here,
    /// not by callers; a duplicate is reported as `AlreadyRegistered`.
    async fn register_employee(&self, new: NewEmployee) -> Result<Employee, StoreError>;

    /// Distinct months with payslip data for the employee, ascending
    async fn list_months(&self, employee: &Employee) -> Result<Vec<String>, StoreError>;

    async fn find_payslip(&self, employee: &Employee, month: &str) -> Result<Option<PayslipRecord>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Sort and dedup month strings
pub(crate) fn distinct_months(mut months: Vec<String>) -> Vec<String> {
    months.sort();
    months.dedup();
    months
}
