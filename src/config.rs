//! Configuration management for gps-proxy
//!
//! Configuration is assembled once at startup from built-in defaults, an
//! optional TOML file and environment variables (in that order, later wins).
//! Handlers only ever see the resulting [`Config`]; they never read the
//! environment themselves.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;

/// Upper bound for the per-call upstream timeout
pub const MAX_UPSTREAM_TIMEOUT_SECONDS: u64 = 300;

/// Upper bound for the preview length of unparseable upstream bodies
pub const MAX_PREVIEW_CHARS: usize = 10_000;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Timeout applied to every outbound GPS51 call
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_seconds: u64,
}

impl ServerConfig {
    /// Socket address to listen on
    ///
    /// `host` must be an IP literal; hostnames are rejected rather than
    /// silently widened to every interface.
    pub fn bind_addr(&self) -> AppResult<SocketAddr> {
        let ip = self.host.trim().parse::<IpAddr>().map_err(|_| {
            AppError::Config(format!(
                "server.host must be an IP address, got '{}'",
                self.host
            ))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            upstream_timeout_seconds: default_upstream_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_upstream_timeout() -> u64 {
    30
}

/// GPS51 upstream configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Base URL of the GPS51 web API, e.g. `https://gps51.com/webapi`
    #[serde(default)]
    pub base_url: Option<String>,
    /// Path (relative to `base_url`) of the login action used by the session strategy
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Number of characters of an unparseable body echoed back as `preview`
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
    /// Whether callers may supply `?token=` to override the configured token
    #[serde(default = "default_allow_token_override")]
    pub allow_token_override: bool,
}

impl UpstreamConfig {
    /// Base URL with any trailing slash removed, `None` when unset or blank
    pub fn base_url(&self) -> Option<&str> {
        non_empty(self.base_url.as_deref()).map(|url| url.trim_end_matches('/'))
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            login_path: default_login_path(),
            preview_chars: default_preview_chars(),
            allow_token_override: default_allow_token_override(),
        }
    }
}

fn default_login_path() -> String {
    "StandardApiAction_login.action".to_string()
}

fn default_preview_chars() -> usize {
    200
}

fn default_allow_token_override() -> bool {
    true
}

/// How outbound calls are authenticated
///
/// Exactly one strategy is active per deployment.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStrategy {
    /// Pre-shared token appended to every outbound call
    #[default]
    Token,
    /// Username/password login producing a session cookie
    Login,
}

impl CredentialStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialStrategy::Token => "token",
            CredentialStrategy::Login => "login",
        }
    }
}

impl FromStr for CredentialStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token" => Ok(CredentialStrategy::Token),
            "login" => Ok(CredentialStrategy::Login),
            other => Err(AppError::Config(format!(
                "unknown credential strategy '{}', expected 'token' or 'login'",
                other
            ))),
        }
    }
}

/// Credential configuration
///
/// Fields are private so secret values only leave this type through the
/// accessors, and `Debug` never prints them.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    strategy: CredentialStrategy,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl CredentialsConfig {
    /// Token strategy with the given token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            strategy: CredentialStrategy::Token,
            token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Login strategy with the given account
    pub fn with_login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            strategy: CredentialStrategy::Login,
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn strategy(&self) -> CredentialStrategy {
        self.strategy
    }

    /// Configured token, `None` when unset or blank
    pub fn static_token(&self) -> Option<&str> {
        non_empty(self.token.as_deref())
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(self.username.as_deref())
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(self.password.as_deref())
    }

    /// Whether the active strategy has everything it needs
    pub fn is_complete(&self) -> bool {
        match self.strategy {
            CredentialStrategy::Token => self.static_token().is_some(),
            CredentialStrategy::Login => self.username().is_some() && self.password().is_some(),
        }
    }
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: Option<&str>| value.map(|_| "<redacted>");
        f.debug_struct("CredentialsConfig")
            .field("strategy", &self.strategy)
            .field("token", &redact(self.static_token()))
            .field("username", &self.username())
            .field("password", &redact(self.password()))
            .finish()
    }
}

/// Request defaults applied when the caller omits a value
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultsConfig {
    /// Device used when a request names none. No fallback happens when unset.
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default = "default_server_id")]
    pub server_id: String,
    #[serde(default = "default_extend")]
    pub extend: String,
}

impl DefaultsConfig {
    /// Fallback device, `None` when unset or blank
    pub fn device_id(&self) -> Option<&str> {
        non_empty(self.device_id.as_deref())
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            device_id: None,
            server_id: default_server_id(),
            extend: default_extend(),
        }
    }
}

fn default_server_id() -> String {
    "0".to_string()
}

fn default_extend() -> String {
    "self".to_string()
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config.validate().map_err(|e| match e {
            AppError::Config(reason) => AppError::Config(format!("{}: {}", path_display, reason)),
            other => other,
        })?;

        Ok(config)
    }

    /// Build the process configuration: defaults, then the optional file,
    /// then the process environment
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup
    ///
    /// Blank values are treated as unset. `GPS51_TOKEN` takes precedence over
    /// the legacy `BASE_TOKEN` name.
    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base) = get("GPS51_BASE") {
            self.upstream.base_url = Some(base);
        }
        if let Some(token) = get("GPS51_TOKEN").or_else(|| get("BASE_TOKEN")) {
            self.credentials.token = Some(token);
        }
        if let Some(username) = get("GPS51_USERNAME") {
            self.credentials.username = Some(username);
        }
        if let Some(password) = get("GPS51_PASSWORD") {
            self.credentials.password = Some(password);
        }
        if let Some(strategy) = get("GPS51_AUTH") {
            self.credentials.strategy = strategy.parse()?;
        }
        if let Some(device) = get("DEFAULT_DEVICE") {
            self.defaults.device_id = Some(device);
        }
        if let Some(server_id) = get("SERVER_ID") {
            self.defaults.server_id = server_id;
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                AppError::Config(format!("PORT must be a valid port number, got '{}'", port))
            })?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.observability.log_level = level;
        }

        Ok(())
    }

    /// Validate configuration after parsing
    ///
    /// Missing credentials and a missing base URL are not rejected here; they
    /// are reported per request so the service can still answer health checks.
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::Config("server.host cannot be empty".to_string()));
        }
        self.server.bind_addr()?;

        if self.server.upstream_timeout_seconds == 0
            || self.server.upstream_timeout_seconds > MAX_UPSTREAM_TIMEOUT_SECONDS
        {
            return Err(AppError::Config(format!(
                "server.upstream_timeout_seconds must be between 1 and {}, got {}",
                MAX_UPSTREAM_TIMEOUT_SECONDS, self.server.upstream_timeout_seconds
            )));
        }

        if self.upstream.preview_chars == 0 || self.upstream.preview_chars > MAX_PREVIEW_CHARS {
            return Err(AppError::Config(format!(
                "upstream.preview_chars must be between 1 and {}, got {}",
                MAX_PREVIEW_CHARS, self.upstream.preview_chars
            )));
        }

        if let Some(base_url) = self.upstream.base_url()
            && !base_url.starts_with("http://")
            && !base_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "upstream.base_url '{}' must start with 'http://' or 'https://'",
                base_url
            )));
        }

        if self.upstream.login_path.trim().is_empty() {
            return Err(AppError::Config(
                "upstream.login_path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
