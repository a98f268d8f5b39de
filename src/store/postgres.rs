use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::{Employee, NewEmployee, PayrollStore, StoreError};
use crate::config::StoreConfig;
use crate::payslip::PayslipRecord;

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Schema applied by `payslip-admin migrate`
pub const SCHEMA_SQL: &str = include_str!("../../migrations/0001_init.sql");

/// Postgres-backed store over the `employees` and `salaries` tables
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| StoreError::InvalidRecord("DATABASE_URL is not configured".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected Postgres pool (max {} connections)", config.max_connections);
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema; every statement is idempotent
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::Executor::execute(&self.pool, SCHEMA_SQL).await?;
        info!("Applied employees/salaries schema");
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

/// Decode one `row_to_json(salaries)` object. Bookkeeping columns
/// (`employee_uuid`, `created_at`) fall through as non-components.
fn payslip_from_row(row: &Value) -> Option<PayslipRecord> {
    let record = PayslipRecord::from_value(row);
    if record.is_none() {
        warn!("Ignoring salaries row without a month");
    }
    record
}

#[async_trait]
impl PayrollStore for PgStore {
    async fn find_employee_by_subject(&self, line_user_id: &str) -> Result<Option<Employee>, StoreError> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT uuid, line_user_id, name, shop FROM employees WHERE line_user_id = $1",
        )
        .bind(line_user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn find_employee_by_uuid(&self, uuid: Uuid) -> Result<Option<Employee>, StoreError> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT uuid, line_user_id, name, shop FROM employees WHERE uuid = $1",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn register_employee(&self, new: NewEmployee) -> Result<Employee, StoreError> {
        // No pre-check: the unique constraint on line_user_id decides
        let result = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (uuid, line_user_id, name, shop)
            VALUES ($1, $2, $3, $4)
            RETURNING uuid, line_user_id, name, shop
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.line_user_id)
        .bind(&new.name)
        .bind(&new.shop)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(employee) => {
                info!("Registered employee {} ({})", employee.uuid, employee.shop);
                Ok(employee)
            }
            Err(e) if is_unique_violation(&e) => Err(StoreError::AlreadyRegistered(new.line_user_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_months(&self, employee: &Employee) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT DISTINCT month FROM salaries WHERE employee_uuid = $1 ORDER BY month")
            .bind(employee.uuid)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("month").map_err(StoreError::from))
            .collect()
    }

    async fn find_payslip(&self, employee: &Employee, month: &str) -> Result<Option<PayslipRecord>, StoreError> {
        // row_to_json keeps every allowance_/deduction_ column, known or not
        let row = sqlx::query(
            r#"
            SELECT row_to_json(s) AS row
            FROM (SELECT * FROM salaries WHERE employee_uuid = $1 AND month = $2 LIMIT 1) s
            "#,
        )
        .bind(employee.uuid)
        .bind(month)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let value: Value = row.try_get("row")?;
        Ok(payslip_from_row(&value))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
