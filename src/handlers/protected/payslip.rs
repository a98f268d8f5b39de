// handlers/protected/payslip.rs - GET /payslip

use axum::{
    extract::{Query, State},
    response::Html,
};
use tower_sessions::Session;

use super::gate::{authorize, EmployeeQuery, UnknownEmployee};
use crate::error::{ApiError, ApiResult};
use crate::payslip::aggregate;
use crate::render::{render_payslip, DownloadButton};
use crate::state::AppState;
use crate::store::Employee;

/// GET /payslip?u=<uuid>&month=<month> - payslip as HTML with a PDF link
pub async fn payslip(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<EmployeeQuery>,
) -> ApiResult<Html<String>> {
    let employee = authorize(&state, &session, &query, UnknownEmployee::Forbidden).await?;
    let month = query.require_month()?;

    let button = DownloadButton::Link {
        employee: employee.uuid.to_string(),
        month: month.clone(),
    };
    Ok(Html(payslip_html(&state, &employee, &month, &button).await?))
}

/// Look up, aggregate and render one month. Shared with the PDF route.
pub(crate) async fn payslip_html(
    state: &AppState,
    employee: &Employee,
    month: &str,
    button: &DownloadButton,
) -> ApiResult<String> {
    let record = state
        .store
        .find_payslip(employee, month)
        .await?
        .ok_or_else(|| ApiError::not_found("該当月の給与明細が見つかりません"))?;

    let summary = aggregate(&record, &state.display_names);
    Ok(render_payslip(&state.templates.payslip, &record, &summary, &employee.name, button))
}
