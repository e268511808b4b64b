//! Command-line interface for gps-proxy
//!
//! Provides argument parsing and subcommand handling for the gps-proxy binary.

use clap::{Parser, Subcommand};

/// Credential-injecting proxy for the GPS51 telemetry API
#[derive(Parser)]
#[command(name = "gps-proxy")]
#[command(version)]
#[command(about = "Credential-injecting proxy for the GPS51 telemetry API")]
#[command(
    long_about = "gps-proxy forwards device-location queries to GPS51, attaches a token or \
    login session, and normalizes the upstream response. Settings come from an optional \
    TOML file and are overridden by environment variables (GPS51_BASE, GPS51_TOKEN, ...)."
)]
pub struct Cli {
    /// Path to an optional configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# gps-proxy Configuration
# ========================
#
# Every value below can be overridden by an environment variable, shown in
# brackets. Environment variables win over this file.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to [HOST]
host = "0.0.0.0"

# Port to listen on [PORT]
port = 3000

# Timeout for each outbound GPS51 call, 1-300 seconds
upstream_timeout_seconds = 30

# ─────────────────────────────────────────────────────────────────────────────
# UPSTREAM
# ─────────────────────────────────────────────────────────────────────────────

[upstream]
# GPS51 web API base URL [GPS51_BASE]
base_url = "https://gps51.com/webapi"

# Login action used by the "login" credential strategy
login_path = "StandardApiAction_login.action"

# Characters of a non-JSON body echoed back in the error preview
preview_chars = 200

# Allow callers to pass ?token= to override the configured token
allow_token_override = true

# ─────────────────────────────────────────────────────────────────────────────
# CREDENTIALS
# ─────────────────────────────────────────────────────────────────────────────
#
# Pick exactly one strategy [GPS51_AUTH]:
#   - "token": send a pre-shared token with every call
#   - "login": log in with username/password and forward the session cookie

[credentials]
strategy = "token"
# token = "..."        # [GPS51_TOKEN or BASE_TOKEN]
# username = "..."     # [GPS51_USERNAME]
# password = "..."     # [GPS51_PASSWORD]

# ─────────────────────────────────────────────────────────────────────────────
# REQUEST DEFAULTS
# ─────────────────────────────────────────────────────────────────────────────

[defaults]
# Device used when a request names none. Leave unset to reject such requests.
# device_id = "865167048531801"   # [DEFAULT_DEVICE]

# serverid / extend sent with ?action= calls when the caller omits them
server_id = "0"                    # [SERVER_ID]
extend = "self"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" [LOG_LEVEL]
# RUST_LOG, when set, takes precedence.
log_level = "info"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use clap::CommandFactory;
    use std::str::FromStr;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_config_path_by_default() {
        let cli = Cli::parse_from(["gps-proxy"]);
        assert!(cli.config.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["gps-proxy", "--config", "custom.toml"]);
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["gps-proxy", "config", "-o", "gps-proxy.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "gps-proxy.toml"
        ));
    }

    #[test]
    fn template_is_valid_config() {
        let config = Config::from_str(generate_config_template())
            .expect("template should parse and validate");
        assert_eq!(config.upstream.base_url(), Some("https://gps51.com/webapi"));
        assert_eq!(config.upstream.preview_chars, 200);
        assert!(config.defaults.device_id().is_none());
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        for section in [
            "[server]",
            "[upstream]",
            "[credentials]",
            "[defaults]",
            "[observability]",
        ] {
            assert!(template.contains(section), "missing {}", section);
        }
    }
}
