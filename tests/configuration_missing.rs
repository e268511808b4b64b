//! Integration tests for missing configuration
//!
//! A proxy started without a base URL or credentials must still serve health
//! checks, and every proxy route must answer 500 `<NAME> missing` before
//! making any outbound call.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use wiremock::MockServer;

#[tokio::test]
async fn test_missing_token_is_500_before_any_call() {
    let server = MockServer::start().await;
    forbid_upstream_calls(&server).await;

    let toml = format!("[upstream]\nbase_url = \"{}{}\"\n", server.uri(), WEBAPI);
    let response = get(app(&toml), "/api/location?deviceid=865167048531801").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "GPS51_TOKEN missing"}));
}

#[tokio::test]
async fn test_missing_base_url_is_500() {
    let response = get(
        app("[credentials]\ntoken = \"abc\"\n"),
        "/api/location?deviceid=865167048531801",
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "GPS51_BASE missing"}));
}

#[tokio::test]
async fn test_missing_token_on_poibatch() {
    let server = MockServer::start().await;
    forbid_upstream_calls(&server).await;

    let toml = format!("[upstream]\nbase_url = \"{}{}\"\n", server.uri(), WEBAPI);
    let response = get(app(&toml), "/api/poibatch").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "GPS51_TOKEN missing"}));
}

#[tokio::test]
async fn test_caller_token_satisfies_missing_configured_token() {
    let server = MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::query_param("token", "caller"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_raw("[]", "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let toml = format!("[upstream]\nbase_url = \"{}{}\"\n", server.uri(), WEBAPI);
    let response = get(app(&toml), "/api/poibatch?token=caller").await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_login_account_is_500() {
    let server = MockServer::start().await;
    forbid_upstream_calls(&server).await;

    let toml = format!(
        "[upstream]\nbase_url = \"{}{}\"\n\n[credentials]\nstrategy = \"login\"\npassword = \"pw\"\n",
        server.uri(),
        WEBAPI
    );
    let response = post_json(
        app(&toml),
        "/api/lastposition",
        r#"{"deviceids":["865167048531801"]}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"error": "GPS51_USERNAME missing"})
    );
}

#[tokio::test]
async fn test_health_works_without_configuration() {
    let response = get(app(""), "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "running");
    assert_eq!(body["env"]["hasCredentials"], false);
    assert_eq!(body["env"]["gps51Base"], serde_json::Value::Null);
}
