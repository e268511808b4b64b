//! gps-proxy HTTP server
//!
//! Loads configuration once, then serves the proxy routes with Axum.

use clap::Parser;
use gps_proxy::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    telemetry,
};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                println!("Configuration template written to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref().map(Path::new))?;

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        base_url = config.upstream.base_url().unwrap_or("<unset>"),
        strategy = config.credentials.strategy().as_str(),
        credentials_configured = config.credentials.is_complete(),
        default_device = config.defaults.device_id().unwrap_or("<none>"),
        "Starting gps-proxy on {}:{}",
        config.server.host,
        config.server.port
    );
    if config.upstream.base_url().is_none() || !config.credentials.is_complete() {
        tracing::warn!("GPS51 base URL or credentials missing; proxy routes will answer 500");
    }

    let addr = config.server.bind_addr()?;

    let state = AppState::new(Arc::new(config))?;
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("GPS proxy listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
