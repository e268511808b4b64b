//! Shared helpers for integration tests: build the proxy against a mock GPS51.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response},
};
use gps_proxy::config::Config;
use gps_proxy::handlers::{self, AppState};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::MockServer;
use wiremock::matchers::any;
use wiremock::{Mock, ResponseTemplate};

/// Base path under which the mock GPS51 API is served
pub const WEBAPI: &str = "/webapi";

/// Token-strategy config pointing at `server`
pub fn token_config(server: &MockServer, token: &str) -> String {
    format!(
        r#"
[upstream]
base_url = "{}{}"

[credentials]
strategy = "token"
token = "{}"
"#,
        server.uri(),
        WEBAPI,
        token
    )
}

/// Login-strategy config pointing at `server`
pub fn login_config(server: &MockServer) -> String {
    format!(
        r#"
[upstream]
base_url = "{}{}"

[credentials]
strategy = "login"
username = "fleet"
password = "hunter2"
"#,
        server.uri(),
        WEBAPI
    )
}

/// Build the full router (middleware included) from a TOML config
pub fn app(toml: &str) -> Router {
    let config = Config::from_str(toml).expect("should parse test config");
    let state = AppState::new(Arc::new(config)).expect("should create AppState");
    handlers::router(state)
}

/// Fail the test if GPS51 is called at all
pub async fn forbid_upstream_calls(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let text = body_string(response).await;
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("body should be JSON ({}): {}", e, text))
}
