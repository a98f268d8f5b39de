use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub store: StoreConfig,
    pub oauth: OAuthConfig,
    pub web: WebConfig,
    pub pdf: PdfConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Signs anti-forgery tokens; must be overridden outside development
    pub secret: String,
    pub ttl_minutes: i64,
    pub secure_cookie: bool,
    pub cookie_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    File,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub line: ProviderConfig,
    /// Google sign-in is only offered when a client id is configured
    pub google: Option<ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub templates_dir: PathBuf,
    pub public_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    pub chrome_path: Option<PathBuf>,
    pub timeout_secs: u64,
    /// Browsers allowed to run at once, counting ones still finishing after a timeout
    pub max_concurrent: usize,
}

const DEV_SESSION_SECRET: &str = "default-secret-key";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Refuse to start with settings that only make sense on a laptop
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment != Environment::Development && self.session.secret == DEV_SESSION_SECRET {
            return Err(ConfigError::Missing("SESSION_SECRET"));
        }
        if self.store.backend == StoreBackend::Postgres && self.store.database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.oauth.line.client_id.is_empty() {
            tracing::warn!("LINE_CHANNEL_ID is not set; sign-in will fail at the provider");
        }
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.session.secret = v;
        }
        if let Ok(v) = env::var("SESSION_TTL_MINUTES") {
            self.session.ttl_minutes = v.parse().unwrap_or(self.session.ttl_minutes);
        }
        if let Ok(v) = env::var("SESSION_SECURE_COOKIE") {
            self.session.secure_cookie = v.parse().unwrap_or(self.session.secure_cookie);
        }

        // Store overrides
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.store.backend = match v.as_str() {
                "postgres" | "pg" | "supabase" => StoreBackend::Postgres,
                _ => StoreBackend::File,
            };
        }
        if let Ok(v) = env::var("DATA_DIR") {
            self.store.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.store.database_url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.store.max_connections = v.parse().unwrap_or(self.store.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.store.connection_timeout = v.parse().unwrap_or(self.store.connection_timeout);
        }

        // LINE overrides
        let line = &mut self.oauth.line;
        if let Ok(v) = env::var("LINE_CHANNEL_ID") {
            line.client_id = v;
        }
        if let Ok(v) = env::var("LINE_CHANNEL_SECRET") {
            line.client_secret = v;
        }
        if let Ok(v) = env::var("LINE_CALLBACK_URL") {
            line.callback_url = v;
        }
        if let Ok(v) = env::var("LINE_AUTHORIZE_URL") {
            line.authorize_url = v;
        }
        if let Ok(v) = env::var("LINE_TOKEN_URL") {
            line.token_url = v;
        }
        if let Ok(v) = env::var("LINE_PROFILE_URL") {
            line.profile_url = v;
        }

        // Google is opt-in
        if let Ok(client_id) = env::var("GOOGLE_CLIENT_ID") {
            let mut google = ProviderConfig::google(&self.oauth.line.callback_url);
            google.client_id = client_id;
            if let Ok(v) = env::var("GOOGLE_CLIENT_SECRET") {
                google.client_secret = v;
            }
            if let Ok(v) = env::var("GOOGLE_CALLBACK_URL") {
                google.callback_url = v;
            }
            self.oauth.google = Some(google);
        }

        // Web overrides
        if let Ok(v) = env::var("TEMPLATES_DIR") {
            self.web.templates_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("PUBLIC_DIR") {
            self.web.public_dir = PathBuf::from(v);
        }

        // PDF overrides
        if let Ok(v) = env::var("CHROME_PATH") {
            self.pdf.chrome_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("PDF_TIMEOUT_SECS") {
            self.pdf.timeout_secs = v.parse().unwrap_or(self.pdf.timeout_secs);
        }
        if let Ok(v) = env::var("PDF_MAX_CONCURRENT") {
            self.pdf.max_concurrent = v.parse().unwrap_or(self.pdf.max_concurrent);
        }

        self
    }

    /// Local defaults: file store, insecure cookie, LINE endpoints
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            session: SessionConfig {
                secret: DEV_SESSION_SECRET.to_string(),
                ttl_minutes: 30,
                secure_cookie: false,
                cookie_name: "payslip.sid".to_string(),
            },
            store: StoreConfig {
                backend: StoreBackend::File,
                data_dir: PathBuf::from("data"),
                database_url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            oauth: OAuthConfig {
                line: ProviderConfig::line("http://localhost:3000/auth/callback"),
                google: None,
            },
            web: WebConfig::default(),
            pdf: PdfConfig {
                chrome_path: None,
                timeout_secs: 60,
                max_concurrent: 2,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            session: SessionConfig {
                secret: DEV_SESSION_SECRET.to_string(),
                ttl_minutes: 30,
                secure_cookie: true,
                cookie_name: "payslip.sid".to_string(),
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                data_dir: PathBuf::from("data"),
                database_url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            oauth: OAuthConfig {
                line: ProviderConfig::line("https://staging.example.com/auth/callback"),
                google: None,
            },
            web: WebConfig::default(),
            pdf: PdfConfig {
                chrome_path: None,
                timeout_secs: 30,
                max_concurrent: 4,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            session: SessionConfig {
                secret: DEV_SESSION_SECRET.to_string(),
                ttl_minutes: 30,
                secure_cookie: true,
                cookie_name: "payslip.sid".to_string(),
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                data_dir: PathBuf::from("data"),
                database_url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            oauth: OAuthConfig {
                line: ProviderConfig::line("https://app.example.com/auth/callback"),
                google: None,
            },
            web: WebConfig::default(),
            pdf: PdfConfig {
                chrome_path: None,
                timeout_secs: 30,
                max_concurrent: 4,
            },
        }
    }
}

impl ProviderConfig {
    pub fn line(callback_url: &str) -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: callback_url.to_string(),
            authorize_url: "https://access.line.me/oauth2/v2.1/authorize".to_string(),
            token_url: "https://api.line.me/oauth2/v2.1/token".to_string(),
            profile_url: "https://api.line.me/v2/profile".to_string(),
        }
    }

    pub fn google(callback_url: &str) -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: callback_url.to_string(),
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            profile_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            public_dir: PathBuf::from("public"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),
}
