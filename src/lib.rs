pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod payslip;
pub mod pdf;
pub mod render;
pub mod state;
pub mod store;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};
use time::Duration;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

use crate::config::SessionConfig;
use crate::state::AppState;

/// The full HTTP application: routes, sessions, request tracing and the
/// static `public/` directory as fallback.
pub fn app(state: AppState) -> Router {
    let public_dir = state.config.web.public_dir.clone();
    let sessions = session_layer(&state.config.session);

    Router::new()
        .route("/health", get(handlers::health))
        .merge(auth_routes())
        .merge(register_routes())
        .merge(content_routes())
        // LINE messaging webhook
        .route("/callback", post(handlers::public::webhook))
        .fallback_service(ServeDir::new(public_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(sessions),
        )
        .with_state(state)
}

fn session_layer(config: &SessionConfig) -> SessionManagerLayer<MemoryStore> {
    // Lax, not Strict: the OAuth callback arrives as a cross-site redirect
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(config.cookie_name.clone())
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(config.secure_cookie)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(config.ttl_minutes)))
}

fn auth_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout))
}

fn register_routes() -> Router<AppState> {
    use handlers::public::register;

    Router::new()
        .route("/register", get(register::form).post(register::submit))
        .route("/register/success", get(register::success))
}

fn content_routes() -> Router<AppState> {
    use handlers::protected;

    Router::new()
        .route("/select", get(protected::select))
        .route("/payslip", get(protected::payslip))
        .route("/ppdf/pdf", get(protected::ppdf))
        .route("/months", get(protected::months))
}
