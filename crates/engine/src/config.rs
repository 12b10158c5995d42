//! Engine tuning knobs.

use giftwatch_alerts::FeeRates;

/// Configuration shared by both cycles and the auto-buy gate.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cheap-lot notifications per user per cycle.
    pub max_notifications_per_check: u32,
    /// Subscription notifications per cycle, across all users.
    pub subs_max_notifications_per_cycle: u32,
    /// Consecutive successful empty fetches before a subscription's
    /// matches are considered gone.
    pub subs_empty_confirm: u32,
    /// Dedup entry lifetime; 0 disables dedup entirely.
    pub dedup_ttl_ms: u64,
    /// Auto-buy pause after a failed purchase.
    pub autobuy_cooldown_ms: u64,
    /// Per-user activity log cap.
    pub log_retention: usize,
    /// Marketplace sale fees shown in notifications.
    pub fees: FeeRates,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_notifications_per_check: 3,
            subs_max_notifications_per_cycle: 5,
            subs_empty_confirm: 2,
            dedup_ttl_ms: 600_000,
            autobuy_cooldown_ms: 300_000,
            log_retention: 50,
            fees: FeeRates::default(),
        }
    }
}
