use async_trait::async_trait;
use base64::Engine;
use headless_chrome::{types::PrintToPdfOptions, Browser, LaunchOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::warn;

use crate::config::PdfConfig;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to render page: {0}")]
    Render(String),

    #[error("PDF rendering timed out after {0}s")]
    Timeout(u64),

    #[error("PDF worker stopped: {0}")]
    Worker(String),
}

/// HTML in, PDF bytes out
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: String) -> Result<Vec<u8>, PdfError>;
}

/// Paper and margins in inches, as the DevTools print call expects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub print_background: bool,
}

const MM_PER_INCH: f64 = 25.4;

impl PageLayout {
    /// A4 portrait, 20 mm top/bottom, 15 mm left/right, backgrounds on
    pub fn a4() -> Self {
        Self {
            paper_width: 210.0 / MM_PER_INCH,
            paper_height: 297.0 / MM_PER_INCH,
            margin_top: 20.0 / MM_PER_INCH,
            margin_bottom: 20.0 / MM_PER_INCH,
            margin_left: 15.0 / MM_PER_INCH,
            margin_right: 15.0 / MM_PER_INCH,
            print_background: true,
        }
    }

    fn print_options(&self) -> PrintToPdfOptions {
        PrintToPdfOptions {
            paper_width: Some(self.paper_width),
            paper_height: Some(self.paper_height),
            margin_top: Some(self.margin_top),
            margin_bottom: Some(self.margin_bottom),
            margin_left: Some(self.margin_left),
            margin_right: Some(self.margin_right),
            print_background: Some(self.print_background),
            ..Default::default()
        }
    }
}

/// Headless Chrome rasterizer. Each render launches its own browser on a
/// blocking thread; the browser is dropped (and killed) when the call ends.
///
/// A render that times out stops being awaited but its thread keeps the
/// browser until Chrome gives up on its own deadline, so every job holds a
/// slot from `slots` until the thread actually returns.
#[derive(Debug, Clone)]
pub struct ChromePdfRenderer {
    chrome_path: Option<PathBuf>,
    timeout: Duration,
    layout: PageLayout,
    slots: Arc<Semaphore>,
}

impl ChromePdfRenderer {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            chrome_path: config.chrome_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            layout: PageLayout::a4(),
            slots: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        }
    }

    fn render_blocking(
        chrome_path: Option<PathBuf>,
        layout: PageLayout,
        timeout: Duration,
        html: &str,
    ) -> Result<Vec<u8>, PdfError> {
        let options = LaunchOptions::default_builder()
            .path(chrome_path)
            .sandbox(false)
            .idle_browser_timeout(timeout)
            .build()
            .map_err(|e| PdfError::Launch(e.to_string()))?;
        let browser = Browser::new(options).map_err(|e| PdfError::Launch(e.to_string()))?;
        let tab = browser.new_tab().map_err(|e| PdfError::Launch(e.to_string()))?;
        tab.set_default_timeout(timeout);

        tab.navigate_to(&data_url(html))
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| PdfError::Render(e.to_string()))?;

        tab.print_to_pdf(Some(layout.print_options()))
            .map_err(|e| PdfError::Render(e.to_string()))
    }
}

#[async_trait]
impl PdfRenderer for ChromePdfRenderer {
    async fn render(&self, html: String) -> Result<Vec<u8>, PdfError> {
        // One deadline covers both waiting for a slot and the render itself
        let deadline = Instant::now() + self.timeout;
        let timed_out = || PdfError::Timeout(self.timeout.as_secs());

        let permit = tokio::time::timeout_at(deadline, self.slots.clone().acquire_owned())
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| PdfError::Worker(e.to_string()))?;

        let chrome_path = self.chrome_path.clone();
        let layout = self.layout;
        let timeout = self.timeout;
        let job = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            Self::render_blocking(chrome_path, layout, timeout, &html)
        });

        match tokio::time::timeout_at(deadline, job).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(PdfError::Worker(join.to_string())),
            Err(_) => {
                warn!("PDF render exceeded {}s; its browser keeps a slot until it exits", self.timeout.as_secs());
                Err(timed_out())
            }
        }
    }
}

fn data_url(html: &str) -> String {
    format!(
        "data:text/html;charset=utf-8;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(html.as_bytes())
    )
}
