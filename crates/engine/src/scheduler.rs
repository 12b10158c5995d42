//! Drives the two cycles on independent fixed intervals.

use crate::scanner::CheapLotScanner;
use crate::watcher::SubscriptionWatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Interval configuration for the two cycles.
#[derive(Debug, Clone)]
pub struct Scheduler {
    pub check_interval: Duration,
    pub subs_check_interval: Duration,
}

impl Scheduler {
    pub fn new(check_interval: Duration, subs_check_interval: Duration) -> Self {
        Self {
            check_interval,
            subs_check_interval,
        }
    }

    /// Spawn both cycle loops. Each loop awaits its cycle body before
    /// the next tick, so two runs of the same cycle can never overlap;
    /// the two different cycles run concurrently with each other. A
    /// `true` on the shutdown channel lets in-flight work finish and
    /// then stops the loop.
    pub fn spawn(
        &self,
        scanner: Arc<CheapLotScanner>,
        watcher: Arc<SubscriptionWatcher>,
        shutdown: watch::Receiver<bool>,
    ) -> (JoinHandle<()>, JoinHandle<()>) {
        let scan_handle = {
            let mut shutdown = shutdown.clone();
            let interval = self.check_interval;
            tokio::spawn(async move {
                info!(interval_ms = interval.as_millis() as u64, "cheap-lot scanner started");
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => scanner.run_cycle().await,
                        _ = shutdown.changed() => break,
                    }
                }
                info!("cheap-lot scanner stopped");
            })
        };

        let watch_handle = {
            let mut shutdown = shutdown.clone();
            let interval = self.subs_check_interval;
            tokio::spawn(async move {
                info!(interval_ms = interval.as_millis() as u64, "subscription watcher started");
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => watcher.run_cycle().await,
                        _ = shutdown.changed() => break,
                    }
                }
                info!("subscription watcher stopped");
            })
        };

        (scan_handle, watch_handle)
    }
}
