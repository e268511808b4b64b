//! Prometheus metrics endpoint
//!
//! Exposes metrics in Prometheus text format for scraping.

use axum::{extract::State, http::StatusCode};

use crate::handlers::AppState;

/// Metrics handler for Prometheus scraping
///
/// # Response
///
/// - `200 OK` with metrics in Prometheus text format
/// - `500 Internal Server Error` if metrics collection fails
///
/// # Example
///
/// ```bash
/// curl http://localhost:3000/metrics
/// # HELP gps_proxy_upstream_requests_total Total number of outbound GPS51 calls by route and outcome
/// # TYPE gps_proxy_upstream_requests_total counter
/// gps_proxy_upstream_requests_total{route="location",outcome="json"} 42
/// ```
pub async fn handler(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics().gather() {
        Ok(output) => (StatusCode::OK, output),
        Err(e) => {
            tracing::error!(error = %e, "Failed to gather metrics for Prometheus scraping");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to gather metrics: {}", e),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::metrics::{Outcome, Route};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_metrics_handler_returns_prometheus_format() {
        let state = AppState::new(Arc::new(Config::default())).expect("should create AppState");
        state
            .metrics()
            .record_upstream(Route::Location, Outcome::Json, Duration::from_millis(5));

        let (status, body) = handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("# TYPE gps_proxy_upstream_requests_total counter"));
        assert!(body.contains(r#"route="location""#));
    }
}
