mod common;

use anyhow::Result;
use reqwest::StatusCode;

use common::{location, NODATA, TANAKA, TANAKA_UUID};

#[tokio::test]
async fn auth_redirects_to_provider_with_state() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;

    let res = client.get(app.url("/auth")).send().await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let target = url::Url::parse(location(&res)?)?;
    assert!(target.as_str().starts_with(&format!("{}/authorize", app.provider_url)));
    let params: Vec<(String, String)> = target.query_pairs().into_owned().collect();
    assert!(params.iter().any(|(k, v)| k == "client_id" && v == "test-client"));
    assert!(params.iter().any(|(k, v)| k == "response_type" && v == "code"));
    assert!(params.iter().any(|(k, v)| k == "state" && !v.is_empty()));
    Ok(())
}

#[tokio::test]
async fn unknown_provider_is_rejected() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.client()?.get(app.url("/auth?provider=github")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn registered_subject_lands_on_select() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;

    let target = app.login(&client, TANAKA).await?;
    assert_eq!(target, format!("/select?u={}", TANAKA_UUID));

    let res = client.get(app.url(&target)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn unregistered_subject_lands_on_register() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;

    assert_eq!(app.login(&client, "U_NEWCOMER").await?, "/register");
    Ok(())
}

#[tokio::test]
async fn google_subjects_are_namespaced() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;

    // Same raw id as a registered LINE user, but a different identity
    assert_eq!(app.login_with(&client, Some("google"), TANAKA).await?, "/register");

    let res = client.get(app.url("/register")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await?.contains(&format!("google:{}", TANAKA)));
    Ok(())
}

#[tokio::test]
async fn callback_rejects_missing_or_mismatched_state() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;

    // No login in flight
    let res = client
        .get(app.url("/auth/callback"))
        .query(&[("code", TANAKA), ("state", "guess")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Wrong state
    app.begin_login(&client, None).await?;
    let res = client
        .get(app.url("/auth/callback"))
        .query(&[("code", TANAKA), ("state", "guess")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Missing state
    app.begin_login(&client, None).await?;
    let res = client.get(app.url("/auth/callback")).query(&[("code", TANAKA)]).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn state_is_single_use() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;

    let state = app.begin_login(&client, None).await?;
    let first = client
        .get(app.url("/auth/callback"))
        .query(&[("code", TANAKA), ("state", state.as_str())])
        .send()
        .await?;
    assert_eq!(first.status(), StatusCode::SEE_OTHER);

    let replay = client
        .get(app.url("/auth/callback"))
        .query(&[("code", NODATA), ("state", state.as_str())])
        .send()
        .await?;
    assert_eq!(replay.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn callback_without_code_or_with_provider_error_is_bad_request() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;

    let state = app.begin_login(&client, None).await?;
    let res = client
        .get(app.url("/auth/callback"))
        .query(&[("state", state.as_str())])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let state = app.begin_login(&client, None).await?;
    let res = client
        .get(app.url("/auth/callback"))
        .query(&[("error", "access_denied"), ("state", state.as_str())])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn provider_failure_is_internal_error() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;

    let state = app.begin_login(&client, None).await?;
    let res = client
        .get(app.url("/auth/callback"))
        .query(&[("code", common::FAILING_CODE), ("state", state.as_str())])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    // Upstream detail stays in the log
    assert!(!res.text().await?.contains(&app.provider_url));
    Ok(())
}

#[tokio::test]
async fn logout_ends_the_session() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;

    let select = app.login(&client, TANAKA).await?;

    let res = client.get(app.url("/auth/logout")).send().await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res)?, "/");

    let res = client.get(app.url(&select)).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
