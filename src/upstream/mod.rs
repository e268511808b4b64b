//! GPS51 upstream access
//!
//! Every outbound call ends in an [`UpstreamResult`], which is mapped onto the
//! caller's response by a single policy parameterized by [`Expectation`].

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::error::AppError;
use crate::metrics::Outcome;

pub mod classify;
pub mod client;
pub mod credentials;

pub use classify::{classify, preview};
pub use client::{ActionParams, Gps51Client};
pub use credentials::Credentials;

/// Outcome of one outbound call
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamResult {
    /// Body parsed as JSON
    Json { value: Value, status: StatusCode },
    /// Body that is not (valid) JSON, kept verbatim
    RawText { text: String, status: StatusCode },
    /// The call itself failed; there is no body or status
    TransportError(String),
}

/// What the call site needs from the upstream body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// Structured data is required; anything else is reported as an error
    Json,
    /// Any body is forwarded, raw text as `text/plain`
    Passthrough,
}

impl UpstreamResult {
    /// Metrics label for this result
    pub fn outcome(&self) -> Outcome {
        match self {
            UpstreamResult::Json { .. } => Outcome::Json,
            UpstreamResult::RawText { .. } => Outcome::RawText,
            UpstreamResult::TransportError(_) => Outcome::TransportError,
        }
    }

    /// Map this result onto the response sent to the caller
    ///
    /// `preview_chars` bounds the body excerpt included when JSON was expected
    /// but not received.
    pub fn respond(self, expectation: Expectation, preview_chars: usize) -> Response {
        match self {
            UpstreamResult::Json { value, status } => (status, Json(value)).into_response(),
            UpstreamResult::RawText { text, status } => match expectation {
                Expectation::Json => {
                    tracing::warn!(
                        upstream_status = status.as_u16(),
                        body_chars = text.chars().count(),
                        "GPS51 returned non-JSON where JSON was expected"
                    );
                    AppError::UpstreamNonJson {
                        preview: preview(&text, preview_chars).to_string(),
                    }
                    .into_response()
                }
                Expectation::Passthrough => (
                    status,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    text,
                )
                    .into_response(),
            },
            UpstreamResult::TransportError(message) => AppError::Transport(message).into_response(),
        }
    }
}
