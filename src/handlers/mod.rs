//! HTTP request handlers for the gps-proxy API

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::{cors_middleware, request_id_middleware};
use crate::upstream::Gps51Client;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod extractor;
pub mod health;
pub mod last_position;
pub mod location;
pub mod metrics;
pub mod poi_batch;

/// Application state shared across all handlers
///
/// Built once at startup. Nothing in it is mutated while serving; all fields
/// are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    client: Arc<Gps51Client>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new AppState from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if metrics registration or HTTP client construction fails.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let metrics = Arc::new(
            Metrics::new()
                .map_err(|e| AppError::Internal(format!("failed to register metrics: {}", e)))?,
        );
        let client = Arc::new(Gps51Client::new(&config, metrics.clone())?);

        Ok(Self {
            config,
            client,
            metrics,
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the GPS51 client
    pub fn client(&self) -> &Gps51Client {
        &self.client
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Optional per-request overrides accepted by the `?action=` style endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ActionQuery {
    pub token: Option<String>,
    pub serverid: Option<String>,
    pub extend: Option<String>,
}

impl ActionQuery {
    /// `serverid`/`extend` from the query, falling back to configured defaults
    pub fn params(&self, config: &Config) -> crate::upstream::ActionParams {
        let pick = |value: &Option<String>, default: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        crate::upstream::ActionParams {
            serverid: pick(&self.serverid, &config.defaults.server_id),
            extend: pick(&self.extend, &config.defaults.extend),
        }
    }
}

/// Build the application router with CORS, request ids and request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .route("/api/location", get(location::handler))
        .route("/api/poibatch", get(poi_batch::handler))
        .route("/api/lastposition", post(last_position::handler))
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
