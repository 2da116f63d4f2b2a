//! TagMatch Engine
//!
//! HTTP service recommending catalog products from selected tags.
//!
//! # Architecture
//!
//! - **Catalog client**: Fetches products from the catalog service
//! - **Recommendation engine**: Pure tag matching and ranking
//! - **API Server**: REST endpoints for frontend consumption
//!
//! # Graceful Shutdown
//!
//! The engine handles SIGTERM and SIGINT signals, ensuring in-flight
//! requests complete before exit.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tagmatch::api::{self, AppState};
use tagmatch::config::{LogFormat, TelemetryConfig};
use tagmatch::{CatalogClient, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Arc::new(Config::from_env().context("failed to load configuration")?);

    // Initialize tracing with structured logging
    init_tracing(&config.telemetry);
    config.log_summary();

    info!("═══════════════════════════════════════════════════════════════");
    info!("  🚀 TagMatch Engine v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════════════════════════");

    #[cfg(feature = "prometheus")]
    init_metrics(&config.telemetry)?;

    // Create shutdown channel
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let client = CatalogClient::new(&config.catalog).context("failed to create catalog client")?;
    let state = Arc::new(AppState::new(client, config.catalog.tags_per_item));

    // Initial catalog load; serve an empty catalog until a refresh succeeds
    match state.refresh().await {
        Ok(count) => info!("✅ Catalog loaded ({} items)", count),
        Err(e) => warn!("⚠️ Initial catalog fetch failed, starting empty: {}", e),
    }

    let mut handles = Vec::new();

    if let Some(every) = config.catalog.refresh_interval {
        info!("🔄 Starting catalog refresher (every {:?})...", every);
        handles.push(spawn_catalog_refresher(state.clone(), every, &shutdown_tx));
    }

    info!("🌐 Starting API server on port {}...", config.api.port);
    handles.push(spawn_api_server(state.clone(), config.clone(), &shutdown_tx));

    info!("═══════════════════════════════════════════════════════════════");
    info!("  ✅ All services started successfully");
    info!("  📡 API: http://{}:{}", config.api.host, config.api.port);
    info!("═══════════════════════════════════════════════════════════════");

    // Wait for shutdown signal or service failure
    tokio::select! {
        _ = shutdown_signal() => {
            info!("📴 Shutdown signal received");
        }
        _ = wait_for_any_failure(&mut handles) => {
            warn!("⚠️ A service stopped, initiating shutdown");
        }
    }

    info!("🛑 Initiating graceful shutdown...");
    let _ = shutdown_tx.send(());

    let shutdown_timeout = Duration::from_secs(30);
    if tokio::time::timeout(shutdown_timeout, shutdown_services(handles))
        .await
        .is_err()
    {
        warn!("⚠️ Shutdown timeout exceeded, forcing exit");
    }

    info!("👋 TagMatch Engine stopped gracefully");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_tracing(telemetry: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tagmatch=debug,tagmatch_engine=debug,tower_http=debug,info"));

    let registry = tracing_subscriber::registry().with(filter);

    match telemetry.log_format {
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(std::env::var("NO_COLOR").is_err()),
            )
            .init(),
    }
}

#[cfg(feature = "prometheus")]
fn init_metrics(telemetry: &TelemetryConfig) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], telemetry.metrics_port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install metrics exporter")?;
    info!("📈 Prometheus metrics on {}", addr);
    Ok(())
}

/// Periodically re-fetch the catalog
fn spawn_catalog_refresher(
    state: Arc<AppState>,
    every: Duration,
    shutdown: &broadcast::Sender<()>,
) -> tokio::task::JoinHandle<()> {
    let mut shutdown_rx = shutdown.subscribe();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);

        // Skip first tick (runs immediately otherwise)
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match state.refresh().await {
                        Ok(count) => info!("🔄 Catalog refreshed ({} items)", count),
                        Err(e) if e.is_error_level() => error!("Catalog refresh failed: {}", e),
                        Err(e) => warn!("Catalog refresh failed: {}", e),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Catalog refresher shutting down");
                    break;
                }
            }
        }
    })
}

/// Spawn the API server
fn spawn_api_server(
    state: Arc<AppState>,
    config: Arc<Config>,
    shutdown: &broadcast::Sender<()>,
) -> tokio::task::JoinHandle<()> {
    let mut shutdown_rx = shutdown.subscribe();

    tokio::spawn(async move {
        let stop = async move {
            let _ = shutdown_rx.recv().await;
            info!("API server shutting down");
        };
        if let Err(e) = api::start_server(state, &config.api, stop).await {
            error!("API server error: {}", e);
        }
    })
}

/// Wait for any task to finish
async fn wait_for_any_failure(handles: &mut [tokio::task::JoinHandle<()>]) {
    loop {
        if handles.iter().any(|h| h.is_finished()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Wait for all services to complete shutdown
async fn shutdown_services(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
