//! Cheap-lot scan cycle.

use crate::autobuy::AutoBuyGate;
use crate::budget::Budget;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::dedup::DedupCache;
use giftwatch_alerts::{format_cheap_lot, NotificationSink};
use giftwatch_core::{GiftFilter, LogEntry, LogKind, SortOrder, Ton, UserId};
use giftwatch_market::MarketplaceGateway;
use giftwatch_store::StateStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The ad-hoc cycle: for every user with monitoring enabled, look for
/// listings under their price ceiling and notify the unseen ones.
pub struct CheapLotScanner {
    store: StateStore,
    gateway: Arc<dyn MarketplaceGateway>,
    sink: Arc<dyn NotificationSink>,
    gate: Arc<AutoBuyGate>,
    dedup: Arc<DedupCache>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl CheapLotScanner {
    pub fn new(
        store: StateStore,
        gateway: Arc<dyn MarketplaceGateway>,
        sink: Arc<dyn NotificationSink>,
        gate: Arc<AutoBuyGate>,
        dedup: Arc<DedupCache>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            sink,
            gate,
            dedup,
            clock,
            config,
        }
    }

    /// Run one full scan over all enabled users.
    pub async fn run_cycle(&self) {
        self.dedup.sweep_with(self.clock.as_ref());

        // Stable order: ascending user id (BTreeMap iteration).
        let users: Vec<(UserId, GiftFilter, Option<Ton>, Option<Ton>)> = self
            .store
            .read(|s| {
                s.users
                    .iter()
                    .filter(|(_, cfg)| cfg.enabled)
                    .map(|(id, cfg)| {
                        (*id, cfg.filter.clone(), cfg.min_price, cfg.max_price)
                    })
                    .collect()
            })
            .await;

        debug!(users = users.len(), "cheap-lot cycle start");
        for (user, filter, min_price, max_price) in users {
            self.scan_user(user, &filter, min_price, max_price).await;
        }
    }

    async fn scan_user(
        &self,
        user: UserId,
        filter: &GiftFilter,
        min_price: Option<Ton>,
        max_price: Option<Ton>,
    ) {
        let listings = match self
            .gateway
            .list_listings(filter, max_price, SortOrder::PriceAscending)
            .await
        {
            Ok(listings) => listings,
            Err(e) => {
                // A failed fetch is not "no matches": skip the user for
                // this cycle without touching any state.
                warn!(user = %user, error = %e, transient = e.is_transient(), "cheap-lot fetch failed, skipping user");
                return;
            }
        };

        let mut budget = Budget::new(self.config.max_notifications_per_check);
        for lot in listings {
            if min_price.is_some_and(|min| lot.price < min) {
                continue;
            }
            let now = self.clock.now_ms();
            if !self.dedup.should_notify(user, &lot.id, now) {
                continue;
            }
            if !budget.try_take() {
                debug!(user = %user, "cheap-lot budget exhausted, stopping scan");
                break;
            }

            let text = format_cheap_lot(&lot, &self.config.fees);
            match self.sink.send(user, &text).await {
                Ok(()) => {
                    info!(user = %user, listing = %lot.id, price = %lot.price, "cheap lot notified");
                    self.dedup.mark_notified(user, lot.id.clone(), now);
                    let retention = self.config.log_retention;
                    let entry = LogEntry::new(
                        now,
                        LogKind::Notify,
                        format!("cheap lot {} at {}", lot.id, lot.price),
                    );
                    self.store
                        .update(|s| s.ensure_user(user).push_log(entry, retention))
                        .await;
                    self.gate.maybe_buy(user, &lot).await;
                }
                Err(e) => {
                    // Dedup mark withheld so the listing is retried next cycle.
                    warn!(user = %user, listing = %lot.id, error = %e, "delivery failed");
                }
            }
        }
    }
}
