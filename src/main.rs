//! Health Check Drop-in: standalone liveness server.
//!
//! Initializes tracing, resolves configuration (CLI, `port` environment
//! variable, optional TOML file), and serves `GET /health` with no checks
//! configured until SIGINT or SIGTERM.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use health_dropin::config::{AppConfig, DEFAULT_LOG_FILTER};
use health_dropin::{CheckSet, ServerBuilder};

/// Health Check Drop-in: serve a /health endpoint
#[derive(Parser, Debug)]
#[command(name = "health-dropin", version, about)]
struct Args {
    /// Path to an optional configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides the `port` environment variable)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level filter (e.g., "health_dropin=debug")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log format: text or json
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Priority: CLI > env (`port`) > config file > defaults
    let mut config = match &args.config {
        Some(path) => AppConfig::load_with_env(path)?,
        None => AppConfig::from_env(),
    };
    if let Some(host) = args.host {
        config.http.host = host;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        host = %config.http.host,
        port = config.http.port,
        "Loaded configuration"
    );

    let server = ServerBuilder::from_config(CheckSet::Unconfigured, &config.http)
        .bind()
        .await?;
    server.shutdown_on_signal();
    server.wait().await?;

    Ok(())
}
