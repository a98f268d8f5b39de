// handlers/public/register.rs - one-time employee registration

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::auth::form_token::{self, REGISTER_PURPOSE};
use crate::auth::{session_identity, store_identity, SessionIdentity};
use crate::error::{ApiError, ApiResult};
use crate::handlers::select_url;
use crate::render::pages;
use crate::state::AppState;
use crate::store::NewEmployee;

#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// GET /register - registration form, or straight to `/select` when the
/// signed-in subject is already registered
pub async fn form(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<RegisterQuery>,
) -> ApiResult<Response> {
    let identity = session_identity(&session)
        .await?
        .ok_or_else(|| ApiError::bad_request("ユーザーIDが見つかりません"))?;

    if let Some(user_id) = query.user_id.as_deref().filter(|id| !id.is_empty()) {
        if user_id != identity.line_user_id {
            warn!("Registration form requested for {} by {}", user_id, identity.line_user_id);
            return Err(ApiError::forbidden("アクセス権がありません"));
        }
    }

    if let Some(employee) = state.store.find_employee_by_subject(&identity.line_user_id).await? {
        if identity.employee_uuid != Some(employee.uuid) {
            store_identity(
                &session,
                &SessionIdentity {
                    employee_uuid: Some(employee.uuid),
                    ..identity
                },
            )
            .await?;
        }
        return Ok(Redirect::to(&select_url(employee.uuid)).into_response());
    }

    let token = form_token::issue(&state.config.session.secret, &identity.line_user_id, REGISTER_PURPOSE)?;
    Ok(Html(pages::register_form(&state.templates.register, &identity.line_user_id, &token)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: Option<String>,
    pub shop: Option<String>,
    /// Older forms posted the org unit as `department`
    pub department: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "_csrf")]
    pub csrf: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// POST /register - create the employee for the signed-in subject
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> ApiResult<Redirect> {
    let (Some(name), Some(shop), Some(user_id), Some(token)) = (
        required(form.name),
        required(form.shop).or_else(|| required(form.department)),
        required(form.user_id),
        required(form.csrf),
    ) else {
        return Err(ApiError::bad_request("必須項目が入力されていません"));
    };

    let identity = session_identity(&session)
        .await?
        .ok_or_else(|| ApiError::forbidden("ログインしてください"))?;
    if user_id != identity.line_user_id {
        warn!("Registration posted for {} by {}", user_id, identity.line_user_id);
        return Err(ApiError::forbidden("アクセス権がありません"));
    }

    form_token::verify(&state.config.session.secret, &token, &identity.line_user_id, REGISTER_PURPOSE)?;

    let employee = state
        .store
        .register_employee(NewEmployee {
            line_user_id: identity.line_user_id.clone(),
            name,
            shop,
        })
        .await?;

    store_identity(
        &session,
        &SessionIdentity {
            employee_uuid: Some(employee.uuid),
            ..identity
        },
    )
    .await?;
    info!("Registration complete for {}", employee.uuid);

    Ok(Redirect::to("/register/success"))
}

/// GET /register/success
pub async fn success() -> Html<String> {
    Html(pages::register_success_page())
}
