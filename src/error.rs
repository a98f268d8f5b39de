// HTTP API Error Types
use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::auth::form_token::FormTokenError;
use crate::auth::oauth::OAuthError;
use crate::pdf::PdfError;
use crate::store::StoreError;

/// HTTP error with a status code and a message that is safe to show the caller.
///
/// 400/403/404 messages describe the problem directly. 500 messages stay
/// generic; the detail goes to the server log at the conversion site.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyRegistered(_) => ApiError::bad_request("このユーザーはすでに登録されています"),
            StoreError::InvalidRecord(msg) => ApiError::bad_request(msg),
            other => {
                // Don't expose storage details to clients
                tracing::error!("Store error: {}", other);
                ApiError::internal_server_error("データの取得に失敗しました")
            }
        }
    }
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::UnknownProvider(name) => ApiError::bad_request(format!("Unknown sign-in provider: {}", name)),
            other => {
                tracing::error!("OAuth error: {}", other);
                ApiError::internal_server_error("ログイン処理中にエラーが発生しました")
            }
        }
    }
}

impl From<PdfError> for ApiError {
    fn from(err: PdfError) -> Self {
        tracing::error!("PDF rendering error: {}", err);
        ApiError::internal_server_error("PDF生成エラー")
    }
}

impl From<FormTokenError> for ApiError {
    fn from(err: FormTokenError) -> Self {
        match err {
            FormTokenError::Signing(msg) => {
                tracing::error!("Form token signing failed: {}", msg);
                ApiError::internal_server_error("フォームの生成に失敗しました")
            }
            other => {
                tracing::warn!("Rejected form token: {}", other);
                ApiError::forbidden("フォームの有効期限が切れたか、不正なリクエストです")
            }
        }
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        tracing::error!("Session store error: {}", err);
        ApiError::internal_server_error("セッションの処理に失敗しました")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message().to_string(),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
