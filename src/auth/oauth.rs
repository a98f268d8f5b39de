use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::{OAuthConfig, ProviderConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Line,
    Google,
}

impl ProviderKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "line" => Some(ProviderKind::Line),
            "google" => Some(ProviderKind::Google),
            _ => None,
        }
    }

    fn scope(self) -> &'static str {
        match self {
            ProviderKind::Line => "profile openid",
            ProviderKind::Google => "openid profile",
        }
    }

    /// Field of the profile response that carries the subject id
    fn subject_field(self) -> &'static str {
        match self {
            ProviderKind::Line => "userId",
            ProviderKind::Google => "sub",
        }
    }

    /// Stored subject ids are LINE ids as-is; other providers are prefixed
    /// so they can never collide with a LINE id.
    fn qualify(self, raw: &str) -> String {
        match self {
            ProviderKind::Line => raw.to_string(),
            ProviderKind::Google => format!("google:{}", raw),
        }
    }
}

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Unknown sign-in provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider profile has no '{0}' field")]
    MissingSubject(&'static str),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// One configured OAuth provider
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    pub kind: ProviderKind,
    config: ProviderConfig,
}

impl OAuthProvider {
    pub fn new(kind: ProviderKind, config: ProviderConfig) -> Self {
        Self { kind, config }
    }

    /// Where to send the browser to start sign-in
    pub fn authorize_url(&self, state: &str) -> Result<Url, OAuthError> {
        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("state", state),
                ("scope", self.kind.scope()),
            ],
        )?;
        Ok(url)
    }

    /// Exchange an authorization code for the subject id via the token and
    /// profile endpoints.
    pub async fn resolve_subject(&self, http: &reqwest::Client, code: &str) -> Result<String, OAuthError> {
        let token: TokenResponse = http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let profile: Value = http
            .get(&self.config.profile_url)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let field = self.kind.subject_field();
        let raw = profile
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(OAuthError::MissingSubject(field))?;

        Ok(self.kind.qualify(raw))
    }
}

/// Providers enabled by configuration
#[derive(Debug, Clone)]
pub struct OAuthProviders {
    line: OAuthProvider,
    google: Option<OAuthProvider>,
}

impl OAuthProviders {
    pub fn from_config(config: &OAuthConfig) -> Self {
        Self {
            line: OAuthProvider::new(ProviderKind::Line, config.line.clone()),
            google: config
                .google
                .clone()
                .map(|google| OAuthProvider::new(ProviderKind::Google, google)),
        }
    }

    pub fn get(&self, kind: ProviderKind) -> Result<&OAuthProvider, OAuthError> {
        match kind {
            ProviderKind::Line => Ok(&self.line),
            ProviderKind::Google => self
                .google
                .as_ref()
                .ok_or_else(|| OAuthError::UnknownProvider("google".to_string())),
        }
    }

    /// Resolve an optional `provider` query value, defaulting to LINE
    pub fn select(&self, name: Option<&str>) -> Result<&OAuthProvider, OAuthError> {
        match name {
            None => Ok(&self.line),
            Some(name) => {
                let kind = ProviderKind::parse(name).ok_or_else(|| OAuthError::UnknownProvider(name.to_string()))?;
                self.get(kind)
            }
        }
    }
}
