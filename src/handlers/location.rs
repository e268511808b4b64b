//! Single-device last position endpoint
//!
//! Handles `GET /api/location?deviceid=<id>`.

use axum::{
    extract::State,
    response::Response,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::handlers::extractor::ProxyQuery;
use crate::upstream::Expectation;

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub deviceid: Option<String>,
}

/// Pick the requested device, or the configured default when none was given
pub fn resolve_device(requested: Option<&str>, fallback: Option<&str>) -> AppResult<String> {
    requested
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .or(fallback)
        .map(str::to_string)
        .ok_or(AppError::Validation("deviceid"))
}

/// Location handler
///
/// Validates the device id, resolves credentials, then issues exactly one
/// data call. The upstream body must be JSON.
pub async fn handler(
    State(state): State<AppState>,
    ProxyQuery(query): ProxyQuery<LocationQuery>,
) -> AppResult<Response> {
    let device_id = resolve_device(
        query.deviceid.as_deref(),
        state.config().defaults.device_id(),
    )?;

    let credentials = state.client().authenticate(None).await?;
    tracing::debug!(
        device_id = %device_id,
        credentials = credentials.kind(),
        "Fetching device last position"
    );

    let result = state
        .client()
        .device_last_position(&credentials, &device_id)
        .await?;

    Ok(result.respond(Expectation::Json, state.config().upstream.preview_chars))
}
