//! Notification delivery: the sink capability, message formatting, and
//! the Telegram bot (delivery plus user commands).

pub mod format;
pub mod sink;
pub mod telegram;

pub use format::{FeeRates, format_cheap_lot, format_floor_change, format_lost_matches};
pub use sink::{DeliveryError, NotificationSink};
pub use telegram::{next_subscription_id, TelegramBot, TelegramError};
