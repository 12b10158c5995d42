//! The polling/match/dedup/notify engine.
//!
//! Two independent scheduled cycles run against the shared state store:
//! the cheap-lot scanner (per-user price-ceiling search) and the
//! subscription watcher (standing watches with floor tracking and
//! empty-confirmation hysteresis). Both guard against duplicate
//! notifications through a TTL dedup cache and cap notifications per
//! cycle.

pub mod autobuy;
pub mod budget;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod scanner;
pub mod scheduler;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testutil;

pub use autobuy::{AutoBuyGate, AutoBuyOutcome, DryRunExecutor, SkipReason};
pub use budget::Budget;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use dedup::DedupCache;
pub use scanner::CheapLotScanner;
pub use scheduler::Scheduler;
pub use watcher::SubscriptionWatcher;
