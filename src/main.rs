use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use payslip_viewer::{app, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up LINE_CHANNEL_ID, DATABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("payslip_viewer=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env();
    config.validate()?;
    info!("Starting payslip viewer in {:?} mode", config.environment);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::from_config(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Payslip viewer listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server stopped")?;
    Ok(())
}
