// handlers/protected/ppdf.rs - GET /ppdf/pdf

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::info;

use super::gate::{authorize, EmployeeQuery, UnknownEmployee};
use super::payslip::payslip_html;
use crate::error::ApiResult;
use crate::render::DownloadButton;
use crate::state::AppState;

/// GET /ppdf/pdf?u=<uuid>&month=<month> - payslip rendered to PDF
pub async fn ppdf(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<EmployeeQuery>,
) -> ApiResult<impl IntoResponse> {
    let employee = authorize(&state, &session, &query, UnknownEmployee::Forbidden).await?;
    let month = query.require_month()?;

    let html = payslip_html(&state, &employee, &month, &DownloadButton::Hidden).await?;
    let pdf = state.pdf.render(html).await?;
    info!("Rendered PDF for {} {} ({} bytes)", employee.uuid, month, pdf.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&month)),
        ],
        pdf,
    ))
}

/// Month strings come from stored data; keep the header value plain ASCII
fn content_disposition(month: &str) -> String {
    let safe: String = month
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("attachment; filename=payslip-{}.pdf", safe)
}
