// handlers/protected/gate.rs - ownership gate shared by the content routes
//
// Caller identity comes from the session. The query only names which
// employee's data is wanted, and that employee must belong to the caller.

use serde::Deserialize;
use tower_sessions::Session;
use tracing::warn;
use uuid::Uuid;

use crate::auth::require_identity;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::Employee;

/// Query accepted by `/select`, `/payslip`, `/ppdf/pdf` and `/months`
#[derive(Debug, Default, Deserialize)]
pub struct EmployeeQuery {
    /// Employee uuid
    pub u: Option<String>,
    /// External subject id, accepted in place of `u`
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub month: Option<String>,
}

impl EmployeeQuery {
    pub fn require_month(&self) -> ApiResult<String> {
        self.month
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("month が指定されていません"))
    }
}

/// How the route answers when the named employee does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownEmployee {
    NotFound,
    Forbidden,
}

/// Which employee the query names
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Uuid(Uuid),
    Subject(String),
}

fn target(query: &EmployeeQuery) -> ApiResult<Target> {
    let non_empty = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(raw) = non_empty(&query.u) {
        let uuid = Uuid::parse_str(&raw).map_err(|_| ApiError::bad_request("u が不正です"))?;
        return Ok(Target::Uuid(uuid));
    }
    if let Some(subject) = non_empty(&query.user_id) {
        return Ok(Target::Subject(subject));
    }
    Err(ApiError::bad_request("ユーザーIDが指定されていません"))
}

/// Resolve the employee named by the query and check it belongs to the
/// signed-in caller.
pub async fn authorize(
    state: &AppState,
    session: &Session,
    query: &EmployeeQuery,
    on_unknown: UnknownEmployee,
) -> ApiResult<Employee> {
    let identity = require_identity(session).await?;

    let employee = match target(query)? {
        Target::Uuid(uuid) => state.store.find_employee_by_uuid(uuid).await?,
        Target::Subject(subject) => state.store.find_employee_by_subject(&subject).await?,
    };

    let Some(employee) = employee else {
        return Err(match on_unknown {
            UnknownEmployee::NotFound => ApiError::not_found("ユーザーが見つかりません"),
            UnknownEmployee::Forbidden => ApiError::forbidden("このユーザーは登録されていません"),
        });
    };

    if employee.line_user_id != identity.line_user_id {
        warn!(
            "Blocked access to employee {} by subject {}",
            employee.uuid, identity.line_user_id
        );
        return Err(ApiError::forbidden("アクセス権がありません"));
    }

    Ok(employee)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(u: Option<&str>, user_id: Option<&str>) -> EmployeeQuery {
        EmployeeQuery {
            u: u.map(str::to_string),
            user_id: user_id.map(str::to_string),
            month: None,
        }
    }

    #[test]
    fn uuid_takes_precedence_over_subject() {
        let uuid = Uuid::new_v4();
        let t = target(&query(Some(&uuid.to_string()), Some("U1"))).unwrap();
        assert_eq!(t, Target::Uuid(uuid));
    }

    #[test]
    fn falls_back_to_subject() {
        assert_eq!(target(&query(Some(""), Some("U1"))).unwrap(), Target::Subject("U1".to_string()));
    }

    #[test]
    fn missing_or_malformed_identifier_is_bad_request() {
        let err = target(&query(None, None)).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let err = target(&query(Some("not-a-uuid"), None)).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn month_is_trimmed_and_required() {
        let mut q = query(None, None);
        assert!(q.require_month().is_err());
        q.month = Some(" 2024-05 ".to_string());
        assert_eq!(q.require_month().unwrap(), "2024-05");
    }
}
