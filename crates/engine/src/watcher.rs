//! Subscription watch cycle.

use crate::autobuy::AutoBuyGate;
use crate::budget::Budget;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::dedup::DedupCache;
use giftwatch_alerts::{format_floor_change, format_lost_matches, NotificationSink};
use giftwatch_core::{
    GiftFilter, Listing, LogEntry, LogKind, SortOrder, Ton, UserId, WatchState,
};
use giftwatch_market::MarketplaceGateway;
use giftwatch_store::StateStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The standing-subscription cycle: tracks the floor price per
/// subscription, detects new arrivals, and applies empty-confirmation
/// hysteresis before trusting "no matches".
pub struct SubscriptionWatcher {
    store: StateStore,
    gateway: Arc<dyn MarketplaceGateway>,
    sink: Arc<dyn NotificationSink>,
    gate: Arc<AutoBuyGate>,
    dedup: Arc<DedupCache>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl SubscriptionWatcher {
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

    /// Run one watch pass over every enabled subscription of every user.
    /// One notification budget spans the whole cycle.
    pub async fn run_cycle(&self) {
        // Stable order: users ascending, subscriptions in insertion order.
        let subs: Vec<(UserId, String, GiftFilter, Option<Ton>)> = self
            .store
            .read(|s| {
                s.users
                    .iter()
                    .flat_map(|(user, cfg)| {
                        cfg.subscriptions
                            .iter()
                            .filter(|sub| sub.enabled)
                            .map(|sub| {
                                (*user, sub.id.clone(), sub.filter.clone(), sub.max_price)
                            })
                    })
                    .collect()
            })
            .await;

        debug!(subscriptions = subs.len(), "subscription cycle start");
        let mut budget = Budget::new(self.config.subs_max_notifications_per_cycle);
        for (user, sub_id, filter, max_price) in subs {
            self.watch_one(user, &sub_id, &filter, max_price, &mut budget)
                .await;
        }
    }

    async fn watch_one(
        &self,
        user: UserId,
        sub_id: &str,
        filter: &GiftFilter,
        max_price: Option<Ton>,
        budget: &mut Budget,
    ) {
        let listings = match self
            .gateway
            .list_listings(filter, max_price, SortOrder::PriceAscending)
            .await
        {
            Ok(listings) => listings,
            Err(e) => {
                // Failed fetch: streak and floor stay untouched.
                warn!(user = %user, subscription = sub_id, error = %e, "subscription fetch failed, skipping");
                return;
            }
        };

        if listings.is_empty() {
            self.observe_empty(user, sub_id).await;
        } else {
            self.observe_matches(user, sub_id, &listings, budget).await;
        }
    }

    /// Successful empty fetch: advance the hysteresis state machine and
    /// report "lost all matches" exactly once per emptiness episode.
    async fn observe_empty(&self, user: UserId, sub_id: &str) {
        let confirm = self.config.subs_empty_confirm;
        let report = self
            .store
            .update(|s| {
                let Some(cfg) = s.users.get_mut(&user) else {
                    return None;
                };
                let num = cfg.subscription_num(sub_id).unwrap_or(0);
                let sub = cfg.subscription_mut(sub_id)?;
                let prev_floor = sub.watch.last_known_floor();
                let (next, lost) = sub.watch.on_empty(confirm);
                sub.watch = next;
                if lost {
                    Some((num, sub.filter.gift.to_string(), prev_floor))
                } else {
                    None
                }
            })
            .await;

        if let Some((num, gift, Some(last_floor))) = report {
            info!(user = %user, subscription = sub_id, "subscription lost all matches");
            let text = format_lost_matches(num, &gift, last_floor);
            // The exhaustion notice is not counted against the match
            // budget; it fires at most once per episode anyway.
            if let Err(e) = self.sink.send(user, &text).await {
                warn!(user = %user, error = %e, "lost-matches delivery failed");
            }
        }
    }

    async fn observe_matches(
        &self,
        user: UserId,
        sub_id: &str,
        listings: &[Listing],
        budget: &mut Budget,
    ) {
        let now = self.clock.now_ms();
        // Listings arrive sorted ascending; the first is the floor.
        let floor = listings[0].price;
        let fresh: Vec<&Listing> = listings
            .iter()
            .filter(|l| self.dedup.should_notify(user, &l.id, now))
            .collect();

        let Some((num, gift, prev_floor, changed)) = self
            .store
            .read(|s| {
                let cfg = s.users.get(&user)?;
                let num = cfg.subscription_num(sub_id)?;
                let sub = cfg.subscription(sub_id)?;
                let prev = sub.watch.last_known_floor();
                Some((num, sub.filter.gift.to_string(), prev, prev != Some(floor)))
            })
            .await
        else {
            return;
        };

        let notify = changed || !fresh.is_empty();
        let mut delivered = false;
        if notify && budget.try_take() {
            let text = format_floor_change(num, &gift, prev_floor, floor, fresh.len());
            match self.sink.send(user, &text).await {
                Ok(()) => {
                    info!(user = %user, subscription = sub_id, floor = %floor, fresh = fresh.len(), "subscription notified");
                    delivered = true;
                    for lot in &fresh {
                        self.dedup.mark_notified(user, lot.id.clone(), now);
                        self.gate.maybe_buy(user, lot).await;
                    }
                }
                Err(e) => {
                    // The unit goes back so a later subscription in this
                    // cycle can still use it.
                    budget.put_back();
                    warn!(user = %user, subscription = sub_id, error = %e, "subscription delivery failed");
                }
            }
        } else if notify {
            debug!(user = %user, subscription = sub_id, "subscription budget exhausted, deferring to next cycle");
        }

        let retention = self.config.log_retention;
        self.store
            .update(|s| {
                let Some(cfg) = s.users.get_mut(&user) else {
                    return;
                };
                if delivered {
                    cfg.push_log(
                        LogEntry::new(
                            now,
                            LogKind::Notify,
                            format!("subscription #{num} {gift} floor {floor}"),
                        ),
                        retention,
                    );
                }
                let Some(sub) = cfg.subscription_mut(sub_id) else {
                    return;
                };
                // A non-empty successful fetch always resets the empty
                // streak, but the floor only moves once the change has
                // actually been delivered; otherwise the next cycle must
                // re-detect it from scratch.
                sub.watch = if delivered || !notify {
                    WatchState::Active { floor }
                } else {
                    match prev_floor {
                        Some(prev) => WatchState::Active { floor: prev },
                        None => WatchState::default(),
                    }
                };
            })
            .await;
    }
}
