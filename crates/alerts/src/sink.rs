//! The notification sink capability consumed by the scan cycles.

use async_trait::async_trait;
use giftwatch_core::UserId;
use thiserror::Error;

/// A failed delivery. The cycles log it and withhold the dedup mark so
/// the same match is retried on the next cycle; there is no in-cycle
/// retry loop.
#[derive(Debug, Error)]
#[error("delivery to {user} failed: {message}")]
pub struct DeliveryError {
    pub user: UserId,
    pub message: String,
}

/// Delivers a formatted message to a user.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, user: UserId, text: &str) -> Result<(), DeliveryError>;
}
