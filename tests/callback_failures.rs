mod common;

use axum::http::{StatusCode, header};
use common::{TestApp, set_cookies};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const LOGIN_PAGE: &str = "http://localhost:5173/login";

async fn assert_failed_callback(app: &TestApp, uri: &str) {
    let response = app.get(uri, None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], LOGIN_PAGE);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(app.session_count().await, 0);
}

#[tokio::test]
async fn test_user_denied_consent() {
    let app = TestApp::new().await;
    let state = app.begin_login("/auth").await;

    assert_failed_callback(
        &app,
        &format!("/google/callback?error=access_denied&state={}", state),
    )
    .await;
}

#[tokio::test]
async fn test_forged_state() {
    let app = TestApp::new().await;
    app.mock_provider_success("1", "Ada").await;

    assert_failed_callback(&app, "/google/callback?code=abc&state=forged-state").await;
}

#[tokio::test]
async fn test_missing_parameters() {
    let app = TestApp::new().await;
    assert_failed_callback(&app, "/google/callback").await;

    let state = app.begin_login("/auth").await;
    assert_failed_callback(&app, &format!("/google/callback?state={}", state)).await;
}

#[tokio::test]
async fn test_state_cannot_be_replayed() {
    let app = TestApp::new().await;
    app.mock_provider_success("1", "Ada").await;
    let state = app.begin_login("/auth").await;

    let response = app
        .get(&format!("/google/callback?code=abc&state={}", state), None)
        .await;
    assert_eq!(
        response.headers()[header::LOCATION],
        "http://localhost:5173/auth/callback"
    );
    assert_eq!(app.session_count().await, 1);

    let response = app
        .get(&format!("/google/callback?code=abc&state={}", state), None)
        .await;
    assert_eq!(response.headers()[header::LOCATION], LOGIN_PAGE);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(app.session_count().await, 1);
}

#[tokio::test]
async fn test_provider_outage() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.provider)
        .await;

    let state = app.begin_login("/auth").await;
    assert_failed_callback(&app, &format!("/google/callback?code=abc&state={}", state)).await;
}

#[tokio::test]
async fn test_provider_rejects_code() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "invalid_grant"})),
        )
        .mount(&app.provider)
        .await;

    let state = app.begin_login("/auth").await;
    assert_failed_callback(&app, &format!("/google/callback?code=abc&state={}", state)).await;
}

#[tokio::test]
async fn test_provider_timeout() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "late"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&app.provider)
        .await;

    let state = app.begin_login("/auth").await;
    assert_failed_callback(&app, &format!("/google/callback?code=abc&state={}", state)).await;
}
