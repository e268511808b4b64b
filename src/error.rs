//! Error types for gps-proxy
//!
//! All request-time errors implement `IntoResponse` for Axum handlers and are
//! rendered as a JSON object with an `error` field.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Message reported when a JSON-expecting call receives something else
pub const NON_JSON_MESSAGE: &str = "GPS51 returned non-JSON";

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    /// A credential or upstream setting needed by this request is not configured
    #[error("{0} missing")]
    ConfigurationMissing(&'static str),

    /// A required request parameter is absent or has the wrong shape
    #[error("{0} required")]
    Validation(&'static str),

    #[error("invalid JSON body: {0}")]
    InvalidBody(String),

    /// Query string could not be deserialized (e.g. a repeated parameter)
    #[error("{0}")]
    InvalidQuery(String),

    #[error("GPS51 login failed: {0}")]
    UpstreamAuthFailure(String),

    /// Upstream answered with a body that could not be parsed as JSON
    #[error("GPS51 returned non-JSON")]
    UpstreamNonJson { preview: String },

    #[error("{0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) | Self::InvalidBody(_) | Self::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UpstreamAuthFailure(_) => StatusCode::UNAUTHORIZED,
            Self::ConfigurationMissing(_)
            | Self::UpstreamNonJson { .. }
            | Self::Transport(_)
            | Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            Self::UpstreamNonJson { preview } => serde_json::json!({
                "error": NON_JSON_MESSAGE,
                "preview": preview,
            }),
            _ => serde_json::json!({
                "error": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
