// handlers/protected/months.rs - GET /months

use axum::{
    extract::{Query, State},
    Json,
};
use tower_sessions::Session;

use super::gate::{authorize, EmployeeQuery, UnknownEmployee};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /months?u=<uuid> - distinct months as a JSON array, ascending
pub async fn months(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<EmployeeQuery>,
) -> ApiResult<Json<Vec<String>>> {
    let employee = authorize(&state, &session, &query, UnknownEmployee::NotFound).await?;

    let months = state.store.list_months(&employee).await?;
    if months.is_empty() {
        return Err(ApiError::not_found("給与データが見つかりません"));
    }

    Ok(Json(months))
}
