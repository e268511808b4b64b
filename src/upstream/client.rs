//! HTTP client for the GPS51 web API
//!
//! Builds outbound URLs, resolves credentials for the configured strategy
//! and turns each call into an [`UpstreamResult`]. No call is ever retried.

use axum::http::header;
use reqwest::{RequestBuilder, redirect};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::credentials::{Credentials, redact_url, session_cookie};
use super::{UpstreamResult, classify};
use crate::config::{Config, CredentialStrategy, CredentialsConfig};
use crate::error::{AppError, AppResult};
use crate::metrics::{Metrics, Outcome, Route};

/// Action path for the single-device last position query
pub const LAST_POSITION_ACTION_PATH: &str = "StandardApiAction_getLastPosition.action";

/// `serverid`/`extend` pair sent with `?action=` style calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionParams {
    pub serverid: String,
    pub extend: String,
}

/// GPS51 API client
///
/// Holds two `reqwest` clients: data calls follow redirects as usual, while
/// the login call must see the redirect response itself to read its cookies.
pub struct Gps51Client {
    http: reqwest::Client,
    login_http: reqwest::Client,
    base_url: Option<String>,
    login_path: String,
    credentials: CredentialsConfig,
    allow_token_override: bool,
    timeout: Duration,
    metrics: Arc<Metrics>,
}

impl Gps51Client {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP clients cannot be constructed
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(config: &Config, metrics: Arc<Metrics>) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.server.upstream_timeout_seconds);

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))?;

        let login_http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build login client: {}", e)))?;

        Ok(Self {
            http,
            login_http,
            base_url: config.upstream.base_url().map(str::to_string),
            login_path: config
                .upstream
                .login_path
                .trim()
                .trim_start_matches('/')
                .to_string(),
            credentials: config.credentials.clone(),
            allow_token_override: config.upstream.allow_token_override,
            timeout,
            metrics,
        })
    }

    /// Configured base URL
    ///
    /// # Errors
    ///
    /// `ConfigurationMissing("GPS51_BASE")` when no base URL is configured.
    pub fn base_url(&self) -> AppResult<&str> {
        self.base_url
            .as_deref()
            .ok_or(AppError::ConfigurationMissing("GPS51_BASE"))
    }

    /// Resolve the credential for one inbound request
    ///
    /// With the token strategy, `token_override` (a caller-supplied `?token=`)
    /// wins over the configured token when overrides are allowed. With the
    /// login strategy a login call is made and its session cookie returned.
    ///
    /// Every configuration check happens before any outbound call.
    pub async fn authenticate(&self, token_override: Option<&str>) -> AppResult<Credentials> {
        let base_url = self.base_url()?;

        match self.credentials.strategy() {
            CredentialStrategy::Token => {
                let override_token = token_override
                    .map(str::trim)
                    .filter(|t| self.allow_token_override && !t.is_empty());
                let token = override_token
                    .or_else(|| self.credentials.static_token())
                    .ok_or(AppError::ConfigurationMissing("GPS51_TOKEN"))?;
                Ok(Credentials::Token(token.to_string()))
            }
            CredentialStrategy::Login => {
                let username = self
                    .credentials
                    .username()
                    .ok_or(AppError::ConfigurationMissing("GPS51_USERNAME"))?;
                let password = self
                    .credentials
                    .password()
                    .ok_or(AppError::ConfigurationMissing("GPS51_PASSWORD"))?;
                self.login(base_url, username, password).await
            }
        }
    }

    /// Log in and capture the session cookie
    async fn login(&self, base_url: &str, username: &str, password: &str) -> AppResult<Credentials> {
        let url = format!("{}/{}", base_url, self.login_path);
        let request = self
            .login_http
            .get(&url)
            .query(&[("account", username), ("password", password)]);

        let start = Instant::now();
        let response = match self.send(&self.login_http, request, Route::Login).await {
            Ok(response) => response,
            Err(message) => {
                self.metrics
                    .record_upstream(Route::Login, Outcome::TransportError, start.elapsed());
                return Err(AppError::Transport(message));
            }
        };

        let status = response.status();
        let cookie = session_cookie(response.headers());
        let outcome = if cookie.is_some() {
            Outcome::Session
        } else {
            Outcome::AuthFailure
        };
        self.metrics
            .record_upstream(Route::Login, outcome, start.elapsed());

        match cookie {
            Some(cookie) => {
                tracing::debug!(
                    upstream_status = status.as_u16(),
                    "GPS51 login returned a session cookie"
                );
                Ok(Credentials::Session(cookie))
            }
            None => {
                self.metrics.login_failure();
                tracing::warn!(
                    upstream_status = status.as_u16(),
                    "GPS51 login response carried no session cookie"
                );
                Err(AppError::UpstreamAuthFailure(
                    "no session cookie in login response".to_string(),
                ))
            }
        }
    }

    /// `GET <base>/StandardApiAction_getLastPosition.action?deviceId=<id>`
    pub async fn device_last_position(
        &self,
        credentials: &Credentials,
        device_id: &str,
    ) -> AppResult<UpstreamResult> {
        let url = format!("{}/{}", self.base_url()?, LAST_POSITION_ACTION_PATH);
        let request = credentials.apply(self.http.get(&url).query(&[("deviceId", device_id)]));
        Ok(self.execute(Route::Location, request).await)
    }

    /// `GET <base>?action=poibatch&token=..&extend=..&serverid=..`
    pub async fn poi_batch(
        &self,
        credentials: &Credentials,
        params: &ActionParams,
    ) -> AppResult<UpstreamResult> {
        let request = self.action_request(
            self.http.get(self.base_url()?),
            "poibatch",
            credentials,
            params,
        );
        Ok(self.execute(Route::PoiBatch, request).await)
    }

    /// `POST <base>?action=lastposition&streamtype=json&...` with a JSON payload
    pub async fn last_position<T: Serialize + ?Sized>(
        &self,
        credentials: &Credentials,
        params: &ActionParams,
        payload: &T,
    ) -> AppResult<UpstreamResult> {
        let request = self
            .action_request(
                self.http.post(self.base_url()?),
                "lastposition",
                credentials,
                params,
            )
            .query(&[("streamtype", "json")])
            .header(header::ACCEPT, "application/json")
            .json(payload);
        Ok(self.execute(Route::LastPosition, request).await)
    }

    fn action_request(
        &self,
        request: RequestBuilder,
        action: &str,
        credentials: &Credentials,
        params: &ActionParams,
    ) -> RequestBuilder {
        credentials
            .apply(request.query(&[("action", action)]))
            .query(params)
    }

    /// Perform one data call and classify its response
    async fn execute(&self, route: Route, request: RequestBuilder) -> UpstreamResult {
        let start = Instant::now();

        let result = match self.send(&self.http, request, route).await {
            Ok(response) => {
                let status = response.status();
                let content_type = response
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                match response.text().await {
                    Ok(body) => classify(content_type.as_deref(), body, status),
                    Err(e) => UpstreamResult::TransportError(self.describe(&e)),
                }
            }
            Err(message) => UpstreamResult::TransportError(message),
        };

        let elapsed = start.elapsed();
        self.metrics.record_upstream(route, result.outcome(), elapsed);
        tracing::info!(
            route = route.as_str(),
            outcome = result.outcome().as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "GPS51 call completed"
        );

        result
    }

    /// Send a request, mapping failures to a credential-free message
    async fn send(
        &self,
        client: &reqwest::Client,
        request: RequestBuilder,
        route: Route,
    ) -> Result<reqwest::Response, String> {
        let request = request.build().map_err(|e| self.describe(&e))?;
        tracing::info!(
            route = route.as_str(),
            method = %request.method(),
            url = %redact_url(request.url()),
            "Calling GPS51"
        );

        client.execute(request).await.map_err(|e| {
            let message = self.describe(&e);
            tracing::warn!(route = route.as_str(), error = %message, "GPS51 call failed");
            message
        })
    }

    /// Describe a transport failure without the request URL, which may carry credentials
    fn describe(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!(
                "GPS51 request timed out after {} seconds",
                self.timeout.as_secs()
            )
        } else if error.is_connect() {
            "GPS51 connection failed".to_string()
        } else if error.is_builder() {
            "invalid GPS51 request URL".to_string()
        } else {
            format!("GPS51 request failed: {}", strip_url(error))
        }
    }
}

fn strip_url(error: &reqwest::Error) -> String {
    let mut rendered = error.to_string();
    if let Some(url) = error.url() {
        rendered = rendered.replace(url.as_str(), "<url>");
    }
    rendered
}
