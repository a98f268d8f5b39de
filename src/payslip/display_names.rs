use std::collections::HashMap;
use std::path::Path;

/// Read-only lookup from raw field key (`allowance_transport`) to its label.
///
/// Built once at import time, loaded at startup and passed to whoever needs
/// it; nothing mutates it afterwards.
#[derive(Debug, Clone, Default)]
pub struct DisplayNameMap {
    labels: HashMap<String, String>,
}

impl DisplayNameMap {
    /// Load `display-names.json`; a missing file yields an empty map so raw
    /// keys are shown instead of failing startup.
    pub async fn load(path: &Path) -> Result<Self, DisplayNameError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Display names not found at {}; raw field keys will be shown", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(DisplayNameError::Io(e)),
        };
        let labels: HashMap<String, String> = serde_json::from_str(&raw)?;
        tracing::info!("Loaded {} display names from {}", labels.len(), path.display());
        Ok(Self { labels })
    }

    /// Label for a key, falling back to the key itself
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.labels.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(String, String)> for DisplayNameMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { labels: iter.into_iter().collect() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayNameError {
    #[error("Failed to read display names: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid display names file: {0}")]
    Json(#[from] serde_json::Error),
}
