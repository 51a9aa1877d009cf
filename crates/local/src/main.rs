//! Farol Local Daemon - test lifecycle over a local JSON API
//!
//! The daemon owns the SQLite index and talks to a Kubo node for content
//! storage and IPNS naming. Everything a collaborator tool needs goes
//! through the HTTP API it serves.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use clap::Parser;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use url::Url;

use service::http::MAX_UPLOAD_SIZE_BYTES;
use service::{Config, ServiceState};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Farol Local Daemon - test lifecycle over a local JSON API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the API server
    #[arg(long, default_value = "3000")]
    api_port: u16,

    /// Path to SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// URL of the Kubo RPC API
    #[arg(long, default_value = "http://127.0.0.1:5001")]
    ipfs_api: Url,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let log_level: tracing::Level = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stdout_layer).init();

    tracing::info!("Starting Farol Local Daemon");

    // Create configuration
    let mut config = Config {
        ipfs_api_url: args.ipfs_api.clone(),
        log_level,
        ..Config::default()
    };

    if let Some(db_path) = args.database {
        config.sqlite_path = Some(db_path);
    }

    // Create state
    let state = match ServiceState::from_config(&config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to create service state: {}", e);
            std::process::exit(1);
        }
    };

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let graceful_shutdown = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl+c");
        tracing::info!("Received shutdown signal");
        let _ = shutdown_tx.send(());
    };
    tokio::spawn(graceful_shutdown);

    // Start API server
    let api_listen_addr = SocketAddr::from_str(&format!("0.0.0.0:{}", args.api_port))?;
    let api_state = state.clone();
    let api_rx = shutdown_rx.clone();

    let api_handle = tokio::spawn(async move {
        tracing::info!("Starting API server on {}", api_listen_addr);
        if let Err(e) = run_api_server(api_listen_addr, api_state, api_rx).await {
            tracing::error!("API server error: {}", e);
        }
    });

    // Wait for shutdown
    let _ = shutdown_rx.clone().changed().await;

    // Wait for the server with timeout
    let _ = tokio::time::timeout(FINAL_SHUTDOWN_TIMEOUT, api_handle).await;

    tracing::info!("Local daemon shutdown complete");
    Ok(())
}

/// Run the API server with write endpoints
async fn run_api_server(
    listen_addr: SocketAddr,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<()> {
    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::DELETE])
        .allow_headers(vec![ACCEPT, CONTENT_TYPE, ORIGIN])
        .allow_origin(Any)
        .allow_credentials(false);

    let trace_layer = TraceLayer::new_for_http();

    let router = Router::new()
        .nest("/_status", service::http::health::router(state.clone()))
        .nest("/api", farol_local::http::api::router(state.clone()))
        .fallback(service::http::not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE_BYTES))
        .with_state(state)
        .layer(cors_layer)
        .layer(trace_layer);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}
