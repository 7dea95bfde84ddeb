//! Weather station client daemon
//!
//! Periodically fetches the station's temperature/humidity series, parses
//! it into measurement batches, and logs the most recent reading. SIGHUP
//! requests an immediate refresh outside the regular interval.
//!
//! Module structure:
//! - `domain/` - Measurement types, series parsing, headline formatting
//! - `io/` - Station HTTP client
//! - `services/` - Refresh cycle orchestration
//! - `infra/` - Configuration, metrics

use clap::Parser;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use weatherstation::domain::display;
use weatherstation::infra::{Config, Metrics};
use weatherstation::io::StationClient;
use weatherstation::services::{RefreshOutcome, Refresher};

/// Weather station client - fetches and reports sensor readings
#[derive(Parser, Debug)]
#[command(name = "weatherstation", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("weatherstation starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        station_url = %config.station_url(),
        hours = %config.station_hours(),
        maxpts = %config.station_maxpts(),
        timeout_secs = %config.station_timeout_secs(),
        refresh_interval_secs = %config.refresh_interval_secs(),
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let metrics = Arc::new(Metrics::new());
    let client = StationClient::new(config.station_config())?;
    let (refresher, refresh_handle) =
        Refresher::new(client, config.refresh_interval_secs(), metrics.clone());

    // Start the refresh loop; one outcome per cycle arrives on this channel
    let (updates_tx, mut updates_rx) = mpsc::channel(8);
    let refresher_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        refresher.run(updates_tx, refresher_shutdown).await;
    });

    // Start metrics reporter
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    // SIGHUP requests an out-of-band refresh
    #[cfg(unix)]
    {
        let refresh = refresh_handle.clone();
        tokio::spawn(async move {
            let Ok(mut hangup) =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
            else {
                warn!("sighup_handler_unavailable");
                return;
            };
            while hangup.recv().await.is_some() {
                if !refresh.trigger() {
                    info!("refresh_already_in_flight");
                }
            }
        });
    }

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    // Consume per-cycle outcomes; failures keep the previous reading
    loop {
        tokio::select! {
            outcome = updates_rx.recv() => match outcome {
                Some(RefreshOutcome::Updated(batch)) => {
                    if let Some(reading) = batch.latest() {
                        info!(
                            reading = %display::headline(reading),
                            points = batch.len(),
                            "station_reading"
                        );
                    }
                }
                Some(RefreshOutcome::NoData) => {
                    warn!("station_reading_unchanged");
                }
                Some(RefreshOutcome::Failed(_)) => {
                    // Cause already logged by the refresher
                }
                None => break,
            },
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("weatherstation shutdown complete");
    Ok(())
}
