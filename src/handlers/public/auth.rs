// handlers/public/auth.rs - OAuth sign-in, callback and logout

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{store_identity, PendingLogin, SessionIdentity, SESSION_PENDING_LOGIN_KEY};
use crate::error::{ApiError, ApiResult};
use crate::handlers::select_url;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub provider: Option<String>,
}

/// GET /auth - start sign-in with LINE (default) or `?provider=google`
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> ApiResult<Redirect> {
    let provider = state.oauth.select(query.provider.as_deref())?;

    let pending = PendingLogin {
        state: Uuid::new_v4().simple().to_string(),
        provider: provider.kind,
    };
    let url = provider.authorize_url(&pending.state)?;
    session.insert(SESSION_PENDING_LOGIN_KEY, &pending).await?;

    Ok(Redirect::to(url.as_str()))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /auth/callback - finish sign-in and route by registration status
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Redirect> {
    // A state value is good for one callback, whatever the outcome
    let pending: Option<PendingLogin> = session.remove(SESSION_PENDING_LOGIN_KEY).await?;

    if let Some(error) = query.error {
        warn!(
            "Provider returned error {}: {}",
            error,
            query.error_description.as_deref().unwrap_or("")
        );
        return Err(ApiError::bad_request(format!("ログインに失敗しました: {}", error)));
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("認証コードがありません"))?;

    let pending = match (pending, query.state) {
        (Some(pending), Some(returned)) if pending.state == returned => pending,
        _ => {
            warn!("OAuth callback with missing or mismatched state");
            return Err(ApiError::forbidden("不正なログインリクエストです"));
        }
    };

    let provider = state.oauth.get(pending.provider)?;
    let subject = provider.resolve_subject(&state.http, &code).await?;
    let employee = state.store.find_employee_by_subject(&subject).await?;

    // New id on privilege change
    session.cycle_id().await?;
    store_identity(
        &session,
        &SessionIdentity {
            line_user_id: subject.clone(),
            employee_uuid: employee.as_ref().map(|e| e.uuid),
        },
    )
    .await?;

    info!("Signed in {} via {:?} (registered: {})", subject, pending.provider, employee.is_some());

    Ok(match employee {
        Some(employee) => Redirect::to(&select_url(employee.uuid)),
        None => Redirect::to("/register"),
    })
}

/// GET /auth/logout - drop the session and return to the top page
pub async fn logout(session: Session) -> ApiResult<Redirect> {
    session.flush().await?;
    info!("Signed out");
    Ok(Redirect::to("/"))
}
