//! Refresh cycle service
//!
//! Runs fetch-parse cycles on an interval and on manual triggers, and
//! delivers one typed outcome per cycle to the presentation layer. The
//! consumer owns the most recent batch; this service holds no cross-cycle
//! state. A trigger arriving while a cycle is in flight is collapsed into
//! it rather than queued.

use crate::domain::series::parse_series;
use crate::domain::types::MeasurementBatch;
use crate::infra::metrics::Metrics;
use crate::io::station::StationClient;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Result of one refresh cycle, delivered exactly once per cycle.
///
/// `NoData` and `Failed` mean "keep showing what you have"; consumers reset
/// any refreshing indicator on every variant.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// New batch replaces the consumer's previous one wholesale
    Updated(MeasurementBatch),
    /// Well-formed response with zero readings
    NoData,
    /// Fetch or parse failure; cause is already logged
    Failed(String),
}

/// Handle for requesting a refresh outside the regular interval
#[derive(Clone)]
pub struct RefreshHandle {
    trigger_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Request a refresh. Returns false if one is already pending or in
    /// flight, in which case this request is collapsed into it.
    pub fn trigger(&self) -> bool {
        self.trigger_tx.try_send(()).is_ok()
    }
}

pub struct Refresher {
    client: StationClient,
    interval: Duration,
    trigger_rx: mpsc::Receiver<()>,
    metrics: Arc<Metrics>,
}

impl Refresher {
    pub fn new(client: StationClient, interval_secs: u64, metrics: Arc<Metrics>) -> (Self, RefreshHandle) {
        // Capacity 1: one pending trigger at most, the rest collapse
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let refresher = Self {
            client,
            interval: Duration::from_secs(interval_secs),
            trigger_rx,
            metrics,
        };
        (refresher, RefreshHandle { trigger_tx })
    }

    /// Run cycles until shutdown. The first cycle starts immediately
    /// (initial load), then one per interval tick or manual trigger.
    pub async fn run(
        mut self,
        updates: mpsc::Sender<RefreshOutcome>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                trigger = self.trigger_rx.recv() => {
                    if trigger.is_none() {
                        return;
                    }
                    info!("manual_refresh_triggered");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("refresher_shutdown");
                        return;
                    }
                    continue;
                }
            }

            let outcome = self.run_cycle().await;

            // Triggers that fired mid-cycle are satisfied by this result
            while self.trigger_rx.try_recv().is_ok() {}

            if updates.send(outcome).await.is_err() {
                info!("refresh_consumer_gone");
                return;
            }
        }
    }

    /// One fetch-parse cycle. Every failure path is terminal for the cycle
    /// and recoverable at this boundary: log the cause, report the outcome,
    /// leave the consumer's state untouched.
    pub async fn run_cycle(&self) -> RefreshOutcome {
        let start = Instant::now();
        self.metrics.record_cycle_started();

        let raw = match self.client.fetch().await {
            Ok(raw) => raw,
            Err(e) => {
                self.metrics.record_fetch_failure();
                error!(error = %e, url = %self.client.endpoint(), "station_fetch_failed");
                return RefreshOutcome::Failed(e.to_string());
            }
        };

        let batch = match parse_series(&raw) {
            Ok(batch) => batch,
            Err(e) => {
                self.metrics.record_parse_failure();
                error!(error = %e, bytes = raw.len(), "series_parse_failed");
                return RefreshOutcome::Failed(e.to_string());
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;

        if batch.is_empty() {
            self.metrics.record_empty_batch();
            warn!(elapsed_ms, "cycle_no_data");
            return RefreshOutcome::NoData;
        }

        self.metrics.record_cycle_complete(batch.len() as u64, elapsed_ms);
        info!(points = batch.len(), elapsed_ms, "cycle_complete");
        RefreshOutcome::Updated(batch)
    }
}
