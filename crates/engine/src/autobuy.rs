//! Optional auto-buy gate with failure cooldown.

use crate::clock::Clock;
use async_trait::async_trait;
use giftwatch_core::{Listing, ListingId, LogEntry, LogKind, UserId};
use giftwatch_market::{PurchaseError, PurchaseExecutor};
use giftwatch_store::StateStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why an auto-buy was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AutoBuyDisabled,
    Paused { until_ms: u64 },
}

/// Outcome of offering a qualifying hit to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoBuyOutcome {
    Attempted { succeeded: bool },
    Skipped(SkipReason),
}

/// Gate in front of the purchase action.
///
/// A failed purchase pauses auto-buy for the cooldown window instead of
/// disabling it: the upstream is likely rate-limiting or out of funds,
/// both recoverable, and a tight retry loop would make either worse.
pub struct AutoBuyGate {
    store: StateStore,
    executor: Arc<dyn PurchaseExecutor>,
    clock: Arc<dyn Clock>,
    cooldown_ms: u64,
    log_retention: usize,
}

impl AutoBuyGate {
    pub fn new(
        store: StateStore,
        executor: Arc<dyn PurchaseExecutor>,
        clock: Arc<dyn Clock>,
        cooldown_ms: u64,
        log_retention: usize,
    ) -> Self {
        Self {
            store,
            executor,
            clock,
            cooldown_ms,
            log_retention,
        }
    }

    pub async fn maybe_buy(&self, user: UserId, listing: &Listing) -> AutoBuyOutcome {
        let now = self.clock.now_ms();
        let gate = self
            .store
            .read(|s| {
                s.users
                    .get(&user)
                    .map(|c| (c.auto_buy_enabled, c.auto_buy_paused(now)))
            })
            .await;

        let (enabled, paused) = gate.unwrap_or((false, None));
        if !enabled {
            return AutoBuyOutcome::Skipped(SkipReason::AutoBuyDisabled);
        }
        if let Some(until_ms) = paused {
            debug!(user = %user, until_ms, "auto-buy paused, skipping");
            let retention = self.log_retention;
            let entry = LogEntry::new(
                now,
                LogKind::AutoBuySkip,
                format!("skipped {}: paused after a failed buy", listing.id),
            );
            self.store
                .update(|s| {
                    if let Some(cfg) = s.users.get_mut(&user) {
                        cfg.push_log(entry, retention);
                    }
                })
                .await;
            return AutoBuyOutcome::Skipped(SkipReason::Paused { until_ms });
        }

        match self.executor.buy(&listing.id).await {
            Ok(()) => {
                info!(user = %user, listing = %listing.id, price = %listing.price, "auto-buy succeeded");
                let retention = self.log_retention;
                let entry = LogEntry::new(
                    now,
                    LogKind::AutoBuy,
                    format!("bought {} for {}", listing.id, listing.price),
                );
                self.store
                    .update(|s| s.ensure_user(user).push_log(entry, retention))
                    .await;
                AutoBuyOutcome::Attempted { succeeded: true }
            }
            Err(e) => {
                let until_ms = now + self.cooldown_ms;
                warn!(user = %user, listing = %listing.id, error = %e, until_ms, "auto-buy failed, pausing");
                let retention = self.log_retention;
                let entry = LogEntry::new(
                    now,
                    LogKind::Error,
                    format!("auto-buy of {} failed: {e}", listing.id),
                );
                self.store
                    .update(|s| {
                        let cfg = s.ensure_user(user);
                        cfg.auto_buy_paused_until_ms = Some(until_ms);
                        cfg.push_log(entry, retention);
                    })
                    .await;
                AutoBuyOutcome::Attempted { succeeded: false }
            }
        }
    }
}

/// Executor that only logs, for alert-only operation.
#[derive(Debug, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl PurchaseExecutor for DryRunExecutor {
    async fn buy(&self, listing: &ListingId) -> Result<(), PurchaseError> {
        info!(listing = %listing, "dry run: would buy");
        Ok(())
    }
}
