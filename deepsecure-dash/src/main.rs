//! deepsecure-dash - Deepfake detection dashboard
//!
//! Accepts media uploads, forwards each one to the detection service, and
//! serves the results to the dashboard page over HTTP and SSE.

use std::fs::OpenOptions;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use deepsecure_common::config::{ConfigOverrides, LoggingConfig, ServiceConfig, ENV_CONFIG_PATH};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use deepsecure_dash::AppState;

/// Command-line arguments for deepsecure-dash
#[derive(Parser, Debug)]
#[command(name = "deepsecure-dash")]
#[command(about = "Deepfake detection dashboard")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = ENV_CONFIG_PATH)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Detection service base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Claim-verification service base URL
    #[arg(long)]
    claim_api_url: Option<String>,

    /// Directory holding the sample files
    #[arg(long)]
    samples_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        Self {
            config_path: args.config,
            detection_base_url: args.api_url,
            claim_base_url: args.claim_api_url,
            port: args.port,
            samples_dir: args.samples_dir,
            log_level: args.log_level,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let host = args.host;

    let config = ServiceConfig::resolve(args.into()).context("Failed to resolve configuration")?;
    init_tracing(&config.logging)?;

    info!("Starting deepsecure-dash");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Detection service: {}", config.detection_base_url);
    info!("Claim service: {}", config.claim_base_url);
    info!("Samples: {}", config.samples_dir.display());

    let state = AppState::new(&config).context("Failed to initialize application state")?;
    let records = state.records.clone();
    let app = deepsecure_dash::build_router(state);

    let addr = SocketAddr::new(host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Release every preview before exit
    let cleared = records.clear().await;
    info!(cleared, "Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level applies to this crate
/// and tower_http.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "deepsecure_dash={level},deepsecure_common={level},tower_http={level}",
            level = logging.level
        ))
    });

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
