mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};

use common::{FakePdf, SATO, SATO_UUID, TANAKA, TANAKA_UUID};

const CONTENT_ROUTES: [&str; 4] = ["/select", "/payslip", "/ppdf/pdf", "/months"];

#[tokio::test]
async fn payslip_renders_line_items_and_totals() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;
    app.login(&client, TANAKA).await?;

    let res = client
        .get(app.url("/payslip"))
        .query(&[("u", TANAKA_UUID), ("month", "2024-05")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let html = res.text().await?;

    assert!(html.contains("田中太郎"));
    assert!(html.contains("<tr><th>基本給</th><td>¥250,000</td></tr>"));
    assert!(html.contains("<tr><th>通勤手当</th><td>¥12,000</td></tr>"));
    assert!(html.contains("<tr><th>健康保険</th><td>¥15,000</td></tr>"));
    assert!(html.contains("<tr><th>厚生年金</th><td>¥27,500</td></tr>"));
    assert!(html.contains("¥262,000"));
    assert!(html.contains("¥42,500"));
    assert!(html.contains("¥219,500"));
    // Zero amounts are not listed
    assert!(!html.contains("allowance_bonus"));
    // Allowances are listed before deductions, in record order
    let base = html.find("基本給").unwrap_or(usize::MAX);
    let commute = html.find("通勤手当").unwrap_or(usize::MAX);
    let health = html.find("健康保険").unwrap_or(usize::MAX);
    assert!(base < commute && commute < health);

    assert!(html.contains(&format!("/ppdf/pdf?u={}&amp;month=2024-05", TANAKA_UUID)));
    assert!(!html.contains("{{"));
    Ok(())
}

#[tokio::test]
async fn payslip_accepts_user_id_in_place_of_uuid() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;
    app.login(&client, TANAKA).await?;

    let res = client
        .get(app.url("/payslip"))
        .query(&[("userId", TANAKA), ("month", "2024-04")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let html = res.text().await?;
    // The April row has no name of its own
    assert!(html.contains("田中太郎"));
    assert!(html.contains("¥200,000"));
    Ok(())
}

#[tokio::test]
async fn missing_month_or_identifier_is_bad_request() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;
    app.login(&client, TANAKA).await?;

    let res = client.get(app.url("/payslip")).query(&[("u", TANAKA_UUID)]).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    for route in CONTENT_ROUTES {
        let res = client.get(app.url(route)).query(&[("month", "2024-05")]).send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", route);

        let res = client
            .get(app.url(route))
            .query(&[("u", "not-a-uuid"), ("month", "2024-05")])
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", route);
    }
    Ok(())
}

#[tokio::test]
async fn unknown_month_is_not_found() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;
    app.login(&client, TANAKA).await?;

    for route in ["/payslip", "/ppdf/pdf"] {
        let res = client
            .get(app.url(route))
            .query(&[("u", TANAKA_UUID), ("month", "1999-01")])
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{}", route);
    }
    assert!(app.pdf.rendered.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn content_routes_require_a_session() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;

    for route in CONTENT_ROUTES {
        let res = client
            .get(app.url(route))
            .query(&[("u", TANAKA_UUID), ("month", "2024-05")])
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{}", route);
    }
    Ok(())
}

#[tokio::test]
async fn content_routes_refuse_another_employees_data() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;
    app.login(&client, TANAKA).await?;

    for route in CONTENT_ROUTES {
        let by_uuid = client
            .get(app.url(route))
            .query(&[("u", SATO_UUID), ("month", "2024-05")])
            .send()
            .await?;
        assert_eq!(by_uuid.status(), StatusCode::FORBIDDEN, "{} by uuid", route);
        assert!(!by_uuid.text().await?.contains("佐藤花子"));

        let by_subject = client
            .get(app.url(route))
            .query(&[("userId", SATO), ("month", "2024-05")])
            .send()
            .await?;
        assert_eq!(by_subject.status(), StatusCode::FORBIDDEN, "{} by userId", route);
    }
    assert!(app.pdf.rendered.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_employee_status_depends_on_route() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;
    app.login(&client, TANAKA).await?;
    let stranger = "00000000-0000-4000-8000-000000000000";

    for (route, expected) in [
        ("/select", StatusCode::NOT_FOUND),
        ("/months", StatusCode::NOT_FOUND),
        ("/payslip", StatusCode::FORBIDDEN),
        ("/ppdf/pdf", StatusCode::FORBIDDEN),
    ] {
        let res = client
            .get(app.url(route))
            .query(&[("u", stranger), ("month", "2024-05")])
            .send()
            .await?;
        assert_eq!(res.status(), expected, "{}", route);
    }
    Ok(())
}

#[tokio::test]
async fn pdf_download_renders_without_button() -> Result<()> {
    let app = common::spawn_app().await?;
    let client = app.client()?;
    app.login(&client, TANAKA).await?;

    let res = client
        .get(app.url("/ppdf/pdf"))
        .query(&[("u", TANAKA_UUID), ("month", "2024-05")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        res.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=payslip-2024-05.pdf"
    );
    assert!(res.bytes().await?.starts_with(b"%PDF"));

    let rendered = app.pdf.rendered.lock().unwrap().clone();
    assert_eq!(rendered.len(), 1);
    assert!(rendered[0].contains("¥262,000"));
    assert!(!rendered[0].contains("/ppdf/pdf"));
    Ok(())
}

#[tokio::test]
async fn pdf_failure_is_internal_error() -> Result<()> {
    let app = common::spawn_app_with(FakePdf {
        fail: true,
        ..Default::default()
    })
    .await?;
    let client = app.client()?;
    app.login(&client, TANAKA).await?;

    let res = client
        .get(app.url("/ppdf/pdf"))
        .query(&[("u", TANAKA_UUID), ("month", "2024-05")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await?, "PDF生成エラー");
    Ok(())
}
