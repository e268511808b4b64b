//! Health check endpoint
//!
//! Served on both `/` and `/health`. Reports whether the proxy is usable
//! without revealing any credential value.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub env: HealthEnv,
}

/// Non-sensitive view of the active configuration
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEnv {
    pub default_device: Option<String>,
    /// Whether the active credential strategy is fully configured
    pub has_credentials: bool,
    pub gps51_base: Option<String>,
    pub strategy: &'static str,
}

/// Health check handler
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let config = state.config();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "running",
            service: "gps-proxy",
            env: HealthEnv {
                default_device: config.defaults.device_id().map(str::to_string),
                has_credentials: config.credentials.is_complete(),
                gps51_base: config.upstream.base_url().map(str::to_string),
                strategy: config.credentials.strategy().as_str(),
            },
        }),
    )
}
