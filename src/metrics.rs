//! Prometheus metrics collection for gps-proxy
//!
//! This module provides metrics instrumentation for tracking:
//! - Outbound GPS51 calls by route and classification outcome
//! - Outbound call latency by route
//! - Login calls that produced no session
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Outbound call kind for type-safe metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Single-device last position (`/api/location`)
    Location,
    /// POI batch passthrough (`/api/poibatch`)
    PoiBatch,
    /// Multi-device last position (`/api/lastposition`)
    LastPosition,
    /// Session login preceding a data call
    Login,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Location => "location",
            Route::PoiBatch => "poibatch",
            Route::LastPosition => "lastposition",
            Route::Login => "login",
        }
    }
}

/// Result of an outbound call, for metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Json,
    RawText,
    TransportError,
    /// Login produced a session cookie
    Session,
    /// Login completed without a session cookie
    AuthFailure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Json => "json",
            Outcome::RawText => "raw_text",
            Outcome::TransportError => "transport_error",
            Outcome::Session => "session",
            Outcome::AuthFailure => "auth_failure",
        }
    }
}

/// Metrics collector for gps-proxy
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    upstream_requests: IntCounterVec,
    upstream_duration: HistogramVec,
    login_failures: IntCounter,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 4 routes × 5 outcomes at most, in practice 4 × 3
        let upstream_requests = IntCounterVec::new(
            Opts::new(
                "gps_proxy_upstream_requests_total",
                "Total number of outbound GPS51 calls by route and outcome",
            ),
            &["route", "outcome"],
        )?;

        let upstream_duration = HistogramVec::new(
            HistogramOpts::new(
                "gps_proxy_upstream_duration_seconds",
                "Outbound GPS51 call latency in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["route"],
        )?;

        // Alert on a sustained rate: usually expired or wrong account credentials
        let login_failures = IntCounter::with_opts(Opts::new(
            "gps_proxy_login_failures_total",
            "Total number of GPS51 login calls that returned no session cookie",
        ))?;

        registry.register(Box::new(upstream_requests.clone()))?;
        registry.register(Box::new(upstream_duration.clone()))?;
        registry.register(Box::new(login_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            upstream_requests,
            upstream_duration,
            login_failures,
        })
    }

    /// Record one outbound call
    ///
    /// Label values come from enums, so lookups cannot fail on cardinality;
    /// a registry error is logged rather than surfaced to the request.
    pub fn record_upstream(&self, route: Route, outcome: Outcome, elapsed: Duration) {
        match self
            .upstream_requests
            .get_metric_with_label_values(&[route.as_str(), outcome.as_str()])
        {
            Ok(counter) => counter.inc(),
            Err(e) => tracing::error!(
                error = %e,
                route = route.as_str(),
                outcome = outcome.as_str(),
                "Failed to record upstream request metric"
            ),
        }

        match self
            .upstream_duration
            .get_metric_with_label_values(&[route.as_str()])
        {
            Ok(histogram) => histogram.observe(elapsed.as_secs_f64()),
            Err(e) => tracing::error!(
                error = %e,
                route = route.as_str(),
                "Failed to record upstream duration metric"
            ),
        }
    }

    /// Count a login that returned no session cookie
    pub fn login_failure(&self) {
        self.login_failures.inc();
    }

    /// Number of outbound calls recorded for a route/outcome pair
    pub fn upstream_count(&self, route: Route, outcome: Outcome) -> u64 {
        self.upstream_requests
            .get_metric_with_label_values(&[route.as_str(), outcome.as_str()])
            .map(|counter| counter.get())
            .unwrap_or(0)
    }

    pub fn login_failures_count(&self) -> u64 {
        self.login_failures.get()
    }

    /// Gather all metrics in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the output is not valid UTF-8.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new_registers_all() {
        assert!(Metrics::new().is_ok());
    }

    #[test]
    fn test_record_upstream_increments_counter() {
        let metrics = Metrics::new().unwrap();
        metrics.record_upstream(Route::Location, Outcome::Json, Duration::from_millis(12));
        metrics.record_upstream(Route::Location, Outcome::Json, Duration::from_millis(8));
        assert_eq!(metrics.upstream_count(Route::Location, Outcome::Json), 2);
        assert_eq!(metrics.upstream_count(Route::Location, Outcome::RawText), 0);
    }

    #[test]
    fn test_gather_includes_recorded_labels() {
        let metrics = Metrics::new().unwrap();
        metrics.record_upstream(
            Route::PoiBatch,
            Outcome::RawText,
            Duration::from_millis(40),
        );
        metrics.login_failure();

        let output = metrics.gather().expect("should gather");
        assert!(output.contains("gps_proxy_upstream_requests_total"));
        assert!(output.contains(r#"route="poibatch""#));
        assert!(output.contains(r#"outcome="raw_text""#));
        assert!(output.contains("gps_proxy_upstream_duration_seconds"));
        assert!(output.contains("gps_proxy_login_failures_total 1"));
    }

    #[test]
    fn test_label_strings_are_stable() {
        assert_eq!(Route::LastPosition.as_str(), "lastposition");
        assert_eq!(Outcome::TransportError.as_str(), "transport_error");
    }
}
