pub mod pages;
pub mod payslip;
pub mod template;

pub use payslip::{render_payslip, DownloadButton};
pub use template::{escape_html, Template};

use std::path::Path;

/// Templates read once at startup and shared read-only by all requests
#[derive(Debug, Clone)]
pub struct Templates {
    pub payslip: Template,
    pub register: Template,
}

impl Templates {
    pub async fn load(dir: &Path) -> std::io::Result<Self> {
        let payslip = Template::load(&dir.join("payslip.html")).await?;
        let register = Template::load(&dir.join("register.html")).await?;
        tracing::info!("Loaded templates from {}", dir.display());
        Ok(Self { payslip, register })
    }
}
