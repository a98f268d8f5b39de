#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use reqwest::header::LOCATION;
use serde_json::{json, Value};
use tempfile::TempDir;

use payslip_viewer::config::{AppConfig, ProviderConfig};
use payslip_viewer::payslip::DisplayNameMap;
use payslip_viewer::pdf::{PdfError, PdfRenderer};
use payslip_viewer::render::Templates;
use payslip_viewer::state::AppState;
use payslip_viewer::store::FileStore;

pub const TANAKA: &str = "U_TANAKA";
pub const TANAKA_UUID: &str = "3f0e8a52-6c1d-4b7e-9a10-2d5c8b7e4f01";
pub const SATO: &str = "U_SATO";
pub const SATO_UUID: &str = "8b2d4c6e-1a3f-4e5d-8c7b-9f0a1b2c3d4e";
/// Registered, but nothing imported yet
pub const NODATA: &str = "U_NODATA";
pub const NODATA_UUID: &str = "c1d2e3f4-a5b6-4c7d-8e9f-0a1b2c3d4e5f";

/// Authorization code the mock provider refuses at the token endpoint
pub const FAILING_CODE: &str = "provider-down";

pub const SESSION_SECRET: &str = "integration-test-secret";

/// Records what it was asked to render instead of launching Chrome
#[derive(Default)]
pub struct FakePdf {
    pub fail: bool,
    pub rendered: Mutex<Vec<String>>,
}

#[async_trait]
impl PdfRenderer for FakePdf {
    async fn render(&self, html: String) -> Result<Vec<u8>, PdfError> {
        if self.fail {
            return Err(PdfError::Render("renderer unavailable".to_string()));
        }
        let bytes = format!("%PDF-1.4\n% {} bytes of html\n", html.len()).into_bytes();
        self.rendered.lock().unwrap().push(html);
        Ok(bytes)
    }
}

pub struct TestApp {
    pub base_url: String,
    pub provider_url: String,
    pub data_dir: TempDir,
    pub pdf: Arc<FakePdf>,
}

pub async fn spawn_app() -> Result<TestApp> {
    spawn_app_with(FakePdf::default()).await
}

pub async fn spawn_app_with(pdf: FakePdf) -> Result<TestApp> {
    let provider_url = serve(mock_provider()).await?;

    let data_dir = tempfile::tempdir()?;
    write_fixtures(data_dir.path())?;

    let mut config = AppConfig::development();
    config.session.secret = SESSION_SECRET.to_string();
    config.store.data_dir = data_dir.path().to_path_buf();
    config.oauth.line = mock_provider_config(ProviderConfig::line("http://localhost/auth/callback"), &provider_url);
    config.oauth.google = Some(mock_provider_config(
        ProviderConfig::google("http://localhost/auth/callback"),
        &provider_url,
    ));

    let templates = Templates::load(&Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")).await?;
    let display_names = DisplayNameMap::load(&data_dir.path().join("display-names.json")).await?;
    let pdf = Arc::new(pdf);

    let state = AppState::new(
        config,
        Arc::new(FileStore::new(data_dir.path())),
        display_names,
        templates,
        pdf.clone(),
    )?;
    let base_url = serve(payslip_viewer::app(state)).await?;

    Ok(TestApp {
        base_url,
        provider_url,
        data_dir,
        pdf,
    })
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Browser-like client: keeps cookies, does not follow redirects
    pub fn client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()?)
    }

    /// GET /auth and return the state the provider would echo back
    pub async fn begin_login(&self, client: &reqwest::Client, provider: Option<&str>) -> Result<String> {
        let url = match provider {
            Some(p) => self.url(&format!("/auth?provider={}", p)),
            None => self.url("/auth"),
        };
        let res = client.get(url).send().await?;
        anyhow::ensure!(res.status() == StatusCode::SEE_OTHER, "unexpected /auth status {}", res.status());

        let authorize = url::Url::parse(location(&res)?)?;
        authorize
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .context("authorize redirect has no state")
    }

    /// Full LINE sign-in as `subject`; returns where the callback redirected
    pub async fn login(&self, client: &reqwest::Client, subject: &str) -> Result<String> {
        self.login_with(client, None, subject).await
    }

    pub async fn login_with(&self, client: &reqwest::Client, provider: Option<&str>, code: &str) -> Result<String> {
        let state = self.begin_login(client, provider).await?;
        let res = client
            .get(self.url("/auth/callback"))
            .query(&[("code", code), ("state", state.as_str())])
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::SEE_OTHER, "unexpected callback status {}", res.status());
        Ok(location(&res)?.to_string())
    }

    pub fn employees_csv(&self) -> Result<String> {
        Ok(std::fs::read_to_string(self.data_dir.path().join("employees.csv"))?)
    }
}

pub fn location(res: &reqwest::Response) -> Result<&str> {
    res.headers()
        .get(LOCATION)
        .context("missing Location header")?
        .to_str()
        .context("Location is not ASCII")
}

async fn serve(router: Router) -> Result<String> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

fn mock_provider_config(mut config: ProviderConfig, provider_url: &str) -> ProviderConfig {
    config.client_id = "test-client".to_string();
    config.client_secret = "test-client-secret".to_string();
    config.authorize_url = format!("{}/authorize", provider_url);
    config.token_url = format!("{}/token", provider_url);
    config.profile_url = format!("{}/profile", provider_url);
    config
}

/// OAuth provider stand-in: the access token is the code, and the profile
/// subject is the access token.
fn mock_provider() -> Router {
    Router::new()
        .route("/token", post(mock_token))
        .route("/profile", get(mock_profile))
}

async fn mock_token(Form(form): Form<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
    let code = form.get("code").cloned().unwrap_or_default();
    if code == FAILING_CODE || form.get("grant_type").map(String::as_str) != Some("authorization_code") {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(json!({ "access_token": code, "token_type": "Bearer", "expires_in": 2592000 })))
}

async fn mock_profile(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    Ok(Json(json!({ "userId": token, "sub": token, "displayName": "Test User" })))
}

fn write_fixtures(dir: &Path) -> Result<()> {
    std::fs::write(
        dir.join("employees.csv"),
        format!(
            "userId,name,shop,uuid\n{},田中太郎,渋谷店,{}\n{},佐藤花子,新宿店,{}\n{},鈴木一郎,池袋店,{}\n",
            TANAKA, TANAKA_UUID, SATO, SATO_UUID, NODATA, NODATA_UUID
        ),
    )?;

    let payslips = json!({
        TANAKA: [
            {
                "userId": TANAKA,
                "name": "田中太郎",
                "month": "2024-05",
                "daysWorked": 20,
                "workHours": 160,
                "overtimeH": 12.5,
                "netPay": 219500,
                "allowance_base": 250000,
                "allowance_commute": "12,000",
                "allowance_bonus": 0,
                "deduction_health": 15000,
                "deduction_pension": 27500
            },
            {
                "userId": TANAKA,
                "month": "2024-04",
                "netPay": 200000,
                "allowance_base": 250000
            }
        ],
        SATO: {
            "userId": SATO,
            "name": "佐藤花子",
            "month": "2024-05",
            "netPay": 180000,
            "allowance_base": 198000
        }
    });
    std::fs::write(dir.join("payslips.json"), serde_json::to_string_pretty(&payslips)?)?;

    let display_names = json!({
        "allowance_base": "基本給",
        "allowance_commute": "通勤手当",
        "deduction_health": "健康保険",
        "deduction_pension": "厚生年金"
    });
    std::fs::write(dir.join("display-names.json"), serde_json::to_string_pretty(&display_names)?)?;
    Ok(())
}
