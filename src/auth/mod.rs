pub mod form_token;
pub mod oauth;

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::ApiError;
use oauth::ProviderKind;

/// Session key for the signed-in identity
pub const SESSION_IDENTITY_KEY: &str = "identity";
/// Session key for the login in flight between `/auth` and `/auth/callback`
pub const SESSION_PENDING_LOGIN_KEY: &str = "pending_login";

/// Who is asking. Only ever read from the session, never from the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub line_user_id: String,
    /// Known once the subject has registered
    pub employee_uuid: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingLogin {
    pub state: String,
    pub provider: ProviderKind,
}

pub async fn session_identity(session: &Session) -> Result<Option<SessionIdentity>, ApiError> {
    Ok(session.get::<SessionIdentity>(SESSION_IDENTITY_KEY).await?)
}

/// The session identity, or 403 when nobody is signed in
pub async fn require_identity(session: &Session) -> Result<SessionIdentity, ApiError> {
    session_identity(session)
        .await?
        .ok_or_else(|| ApiError::forbidden("ログインしてください"))
}

pub async fn store_identity(session: &Session, identity: &SessionIdentity) -> Result<(), ApiError> {
    session.insert(SESSION_IDENTITY_KEY, identity).await?;
    Ok(())
}
