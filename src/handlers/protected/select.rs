// handlers/protected/select.rs - GET /select month picker

use axum::{
    extract::{Query, State},
    response::Html,
};
use tower_sessions::Session;

use super::gate::{authorize, EmployeeQuery, UnknownEmployee};
use crate::error::{ApiError, ApiResult};
use crate::render::pages;
use crate::state::AppState;

/// GET /select?u=<uuid> - list the months with payslip data
pub async fn select(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<EmployeeQuery>,
) -> ApiResult<Html<String>> {
    let employee = authorize(&state, &session, &query, UnknownEmployee::NotFound).await?;

    let months = state.store.list_months(&employee).await?;
    if months.is_empty() {
        return Err(ApiError::not_found("給与データが見つかりません"));
    }

    Ok(Html(pages::select_page(&employee.uuid.to_string(), &months)))
}
