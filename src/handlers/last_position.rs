//! Multi-device last position endpoint
//!
//! Handles `POST /api/lastposition`. The body names one or more devices:
//!
//! ```json
//! { "deviceids": ["865167048531801"], "username": "fleet", "lastquerypositiontime": 1760000000000 }
//! ```
//!
//! `deviceids` may also be a single string. Fields the proxy does not know
//! are forwarded unchanged. A JSON object answer is annotated with a
//! `_proxy` block describing what was asked for.

use axum::{
    body::Bytes,
    extract::State,
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::handlers::extractor::ProxyQuery;
use crate::handlers::{ActionQuery, AppState};
use crate::upstream::{ActionParams, Expectation, UpstreamResult};

/// Username sent upstream when the caller supplies no body at all
const DEFAULT_USERNAME: &str = "proxy";

/// Inbound request body
#[derive(Debug, Default, Deserialize)]
pub struct LastPositionRequest {
    /// Kept untyped so a wrong shape is reported as a missing field, not a parse error
    #[serde(default)]
    deviceids: Option<Value>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    lastquerypositiontime: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl LastPositionRequest {
    /// Parse a raw body; an empty body is an empty request
    pub fn from_body(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| AppError::InvalidBody(e.to_string()))
    }

    /// Device ids as a non-empty list
    ///
    /// The fallback applies only when `deviceids` is absent (or null); a
    /// present but malformed value is always rejected.
    pub fn device_ids(&self, fallback: Option<&str>) -> AppResult<Vec<String>> {
        let missing = || AppError::Validation("deviceids");

        match &self.deviceids {
            None | Some(Value::Null) => fallback
                .map(|id| vec![id.to_string()])
                .ok_or_else(missing),
            Some(Value::String(id)) if !id.trim().is_empty() => Ok(vec![id.trim().to_string()]),
            Some(Value::Array(items)) if !items.is_empty() => items
                .iter()
                .map(|item| match item {
                    Value::String(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
                    _ => Err(missing()),
                })
                .collect(),
            Some(_) => Err(missing()),
        }
    }

    fn is_empty(&self) -> bool {
        self.deviceids.is_none()
            && self.username.is_none()
            && self.lastquerypositiontime.is_none()
            && self.extra.is_empty()
    }
}

/// Body sent to GPS51
#[derive(Debug, Serialize)]
pub struct LastPositionPayload<'a> {
    deviceids: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lastquerypositiontime: Option<&'a Value>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

/// `_proxy` annotation added to JSON object answers
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyMetadata<'a> {
    requested_device_ids: &'a [String],
    serverid: &'a str,
    extend: &'a str,
    upstream_status: u16,
}

pub async fn handler(
    State(state): State<AppState>,
    ProxyQuery(query): ProxyQuery<ActionQuery>,
    body: Bytes,
) -> AppResult<Response> {
    let request = LastPositionRequest::from_body(&body)?;
    let device_ids = request.device_ids(state.config().defaults.device_id())?;

    let credentials = state.client().authenticate(query.token.as_deref()).await?;
    let params = query.params(state.config());

    let username = match request.username.as_deref() {
        Some(name) => Some(name),
        None if request.is_empty() => Some(DEFAULT_USERNAME),
        None => None,
    };
    let payload = LastPositionPayload {
        deviceids: &device_ids,
        username,
        lastquerypositiontime: request.lastquerypositiontime.as_ref(),
        extra: &request.extra,
    };
    tracing::debug!(
        device_count = device_ids.len(),
        serverid = %params.serverid,
        extend = %params.extend,
        "Requesting last positions"
    );

    let result = state
        .client()
        .last_position(&credentials, &params, &payload)
        .await?;

    Ok(annotate(result, &device_ids, &params)
        .respond(Expectation::Json, state.config().upstream.preview_chars))
}

/// Add `_proxy` metadata to a JSON object answer; other results pass unchanged
pub fn annotate(
    result: UpstreamResult,
    device_ids: &[String],
    params: &ActionParams,
) -> UpstreamResult {
    match result {
        UpstreamResult::Json { mut value, status } => {
            let records = value
                .get("records")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0);
            tracing::info!(records, upstream_status = status.as_u16(), "GPS51 returned JSON");

            if let Value::Object(map) = &mut value {
                let metadata = ProxyMetadata {
                    requested_device_ids: device_ids,
                    serverid: &params.serverid,
                    extend: &params.extend,
                    upstream_status: status.as_u16(),
                };
                match serde_json::to_value(&metadata) {
                    Ok(metadata) => {
                        map.insert("_proxy".to_string(), metadata);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to serialize proxy metadata");
                    }
                }
            }
            UpstreamResult::Json { value, status }
        }
        other => other,
    }
}
