use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::auth::oauth::OAuthProviders;
use crate::config::{AppConfig, StoreBackend};
use crate::payslip::DisplayNameMap;
use crate::pdf::{ChromePdfRenderer, PdfRenderer};
use crate::render::Templates;
use crate::store::{file::DISPLAY_NAMES_FILE, FileStore, PayrollStore, PgStore};

/// Everything a request handler needs. Built once in `main`; all of it is
/// read-only or a handle (pool, HTTP client) that is safe to share.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn PayrollStore>,
    pub display_names: Arc<DisplayNameMap>,
    pub templates: Arc<Templates>,
    pub pdf: Arc<dyn PdfRenderer>,
    pub oauth: Arc<OAuthProviders>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Wire up the configured store, templates, display names and the
    /// Chrome renderer.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn PayrollStore> = match config.store.backend {
            StoreBackend::File => {
                info!("Using file store in {}", config.store.data_dir.display());
                Arc::new(FileStore::new(&config.store.data_dir))
            }
            StoreBackend::Postgres => Arc::new(
                PgStore::connect(&config.store)
                    .await
                    .context("failed to connect to Postgres")?,
            ),
        };

        let display_names = DisplayNameMap::load(&config.store.data_dir.join(DISPLAY_NAMES_FILE))
            .await
            .context("failed to load display names")?;

        let templates = Templates::load(&config.web.templates_dir)
            .await
            .with_context(|| format!("failed to load templates from {}", config.web.templates_dir.display()))?;

        let pdf: Arc<dyn PdfRenderer> = Arc::new(ChromePdfRenderer::new(&config.pdf));

        Self::new(config, store, display_names, templates, pdf)
    }

    /// Assemble state from parts; tests use this to plug in a fake renderer
    pub fn new(
        config: AppConfig,
        store: Arc<dyn PayrollStore>,
        display_names: DisplayNameMap,
        templates: Templates,
        pdf: Arc<dyn PdfRenderer>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("payslip-viewer/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            oauth: Arc::new(OAuthProviders::from_config(&config.oauth)),
            config: Arc::new(config),
            store,
            display_names: Arc::new(display_names),
            templates: Arc::new(templates),
            pdf,
            http,
        })
    }
}
