//! Per-user configuration and activity log.

use crate::{GiftFilter, Subscription, Ton};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Telegram chat id of a user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category of a recent-activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogKind {
    /// A notification was delivered.
    Notify,
    /// An auto-buy was attempted.
    AutoBuy,
    /// An auto-buy was skipped or paused.
    AutoBuySkip,
    /// A delivery or upstream error worth surfacing on the dashboard.
    Error,
}

/// One entry in the bounded recent-activity trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Epoch milliseconds.
    pub at_ms: u64,
    pub kind: LogKind,
    pub text: String,
}

impl LogEntry {
    pub fn new(at_ms: u64, kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            at_ms,
            kind,
            text: text.into(),
        }
    }
}

/// Per-user monitoring configuration.
///
/// Created on first interaction; mutated by command handlers, the
/// dashboard API, and the cycles themselves (auto-buy pausing, logs,
/// subscription watch state).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Cheap-lot monitoring on/off.
    pub enabled: bool,
    /// Cheap-lot search filter.
    pub filter: GiftFilter,
    /// Price floor for cheap-lot hits; `None` = unbounded.
    pub min_price: Option<Ton>,
    /// Price ceiling for cheap-lot hits; `None` = unbounded.
    pub max_price: Option<Ton>,
    pub auto_buy_enabled: bool,
    /// Epoch ms until which auto-buy is paused after a failed purchase.
    pub auto_buy_paused_until_ms: Option<u64>,
    /// Standing watches; insertion order is the display numbering.
    pub subscriptions: Vec<Subscription>,
    /// Bounded recent-activity trail for the dashboard.
    pub logs: Vec<LogEntry>,
}

impl UserConfig {
    /// Append a log entry, evicting the oldest beyond `retention`.
    pub fn push_log(&mut self, entry: LogEntry, retention: usize) {
        self.logs.push(entry);
        if self.logs.len() > retention {
            let excess = self.logs.len() - retention;
            self.logs.drain(..excess);
        }
    }

    pub fn subscription(&self, id: &str) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| s.id == id)
    }

    pub fn subscription_mut(&mut self, id: &str) -> Option<&mut Subscription> {
        self.subscriptions.iter_mut().find(|s| s.id == id)
    }

    /// Display number of a subscription (1-based insertion order).
    pub fn subscription_num(&self, id: &str) -> Option<usize> {
        self.subscriptions.iter().position(|s| s.id == id).map(|i| i + 1)
    }

    /// Returns the pause deadline if auto-buy is currently paused.
    pub fn auto_buy_paused(&self, now_ms: u64) -> Option<u64> {
        match self.auto_buy_paused_until_ms {
            Some(until) if now_ms < until => Some(until),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_log_retention_evicts_oldest() {
        let mut cfg = UserConfig::default();
        for i in 0..5 {
            cfg.push_log(LogEntry::new(i, LogKind::Notify, format!("entry {i}")), 3);
        }
        assert_eq!(cfg.logs.len(), 3);
        assert_eq!(cfg.logs[0].text, "entry 2");
        assert_eq!(cfg.logs[2].text, "entry 4");
    }

    #[test]
    fn test_auto_buy_pause_window() {
        let mut cfg = UserConfig::default();
        assert_eq!(cfg.auto_buy_paused(1000), None);

        cfg.auto_buy_paused_until_ms = Some(2000);
        assert_eq!(cfg.auto_buy_paused(1999), Some(2000));
        // Boundary: pause is over exactly at the deadline
        assert_eq!(cfg.auto_buy_paused(2000), None);
    }

    #[test]
    fn test_subscription_display_numbering() {
        let mut cfg = UserConfig::default();
        cfg.subscriptions
            .push(Subscription::new("a", GiftFilter::new("X"), None));
        cfg.subscriptions
            .push(Subscription::new("b", GiftFilter::new("Y"), None));
        assert_eq!(cfg.subscription_num("a"), Some(1));
        assert_eq!(cfg.subscription_num("b"), Some(2));
        assert_eq!(cfg.subscription_num("c"), None);
    }
}
