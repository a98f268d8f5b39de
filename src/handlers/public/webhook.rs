// handlers/public/webhook.rs - POST /callback (LINE messaging webhook)

use axum::{http::StatusCode, Json};
use serde_json::Value;
use tracing::info;

/// Acknowledge and log; events are not acted on
pub async fn webhook(Json(payload): Json<Value>) -> StatusCode {
    info!("Webhook received: {}", payload);
    StatusCode::OK
}
