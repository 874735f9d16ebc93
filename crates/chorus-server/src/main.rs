//! Chorus Server
//!
//! Runs every submitted text past three LLM safety classifiers and serves
//! the consensus verdicts over HTTP.

use anyhow::Result;
use chorus_server::{create_router, AppState, Cli, ServerConfig};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting Chorus Server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::load(&cli.config, &cli)?;
    info!("Configuration loaded successfully");
    info!("Database: {:?}", config.database_path);
    info!("Provider timeout: {}s", config.request_timeout_secs);

    let metrics_handle = init_metrics()?;

    let state = AppState::from_config(&config)?.with_metrics(metrics_handle);
    info!("Application state initialized successfully");

    let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("chorus=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chorus=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!("chorus_analyses_total", "Total number of panel analyses");
    metrics::describe_counter!(
        "chorus_verdicts_total",
        "Consensus verdicts by outcome"
    );
    metrics::describe_counter!(
        "chorus_provider_failures_total",
        "Provider calls that failed closed, by model"
    );
    metrics::describe_counter!(
        "chorus_storage_errors_total",
        "Analyses whose results could not be stored"
    );
    metrics::describe_histogram!(
        "chorus_analysis_latency_ms",
        metrics::Unit::Milliseconds,
        "End-to-end analysis latency in milliseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
