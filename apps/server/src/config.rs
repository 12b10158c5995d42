//! Environment configuration.
//!
//! Every knob falls back to a safe default on invalid or missing input;
//! only the Telegram bot token is required, since without it nothing
//! can be delivered at all.

use giftwatch_alerts::FeeRates;
use giftwatch_core::PremarketStatus;
use giftwatch_engine::EngineConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingRequired(&'static str),
}

/// Application configuration assembled from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub check_interval: Duration,
    pub subs_check_interval: Duration,
    pub gateway_timeout: Duration,
    pub premarket: PremarketStatus,
    pub portal_base_url: String,
    pub portal_token: String,
    pub mrkt_base_url: String,
    pub mrkt_token: String,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingRequired("TELEGRAM_BOT_TOKEN"))?;

        let engine = EngineConfig {
            max_notifications_per_check: env_u32("MAX_NOTIFICATIONS_PER_CHECK", 3),
            subs_max_notifications_per_cycle: env_u32("SUBS_MAX_NOTIFICATIONS_PER_CYCLE", 5),
            subs_empty_confirm: env_u32("SUBS_EMPTY_CONFIRM", 2),
            // Negative TTL input clamps to 0 ("never dedup")
            dedup_ttl_ms: env_i64("DEDUP_TTL_MS", 600_000).max(0) as u64,
            autobuy_cooldown_ms: env_u64("AUTOBUY_COOLDOWN_MS", 300_000),
            log_retention: env_u64("LOG_RETENTION", 50) as usize,
            fees: FeeRates {
                portal_bps: env_u32("PORTAL_FEE_BPS", 500),
                mrkt_bps: env_u32("MRKT_FEE_BPS", 500),
            },
        };

        Ok(Self {
            bot_token,
            check_interval: Duration::from_millis(env_u64("CHECK_INTERVAL_MS", 5_000)),
            subs_check_interval: Duration::from_millis(env_u64("SUBS_CHECK_INTERVAL_MS", 15_000)),
            gateway_timeout: Duration::from_millis(env_u64("GATEWAY_TIMEOUT_MS", 10_000)),
            premarket: PremarketStatus::parse_or_default(
                &std::env::var("PREMARKET_STATUS").unwrap_or_default(),
            ),
            portal_base_url: env_string(
                "PORTAL_BASE_URL",
                giftwatch_market::PortalClient::DEFAULT_BASE_URL,
            ),
            portal_token: std::env::var("PORTAL_AUTH_TOKEN").unwrap_or_default(),
            mrkt_base_url: env_string(
                "MRKT_BASE_URL",
                giftwatch_market::MrktClient::DEFAULT_BASE_URL,
            ),
            mrkt_token: std::env::var("MRKT_AUTH_TOKEN").unwrap_or_default(),
            engine,
        })
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    parse_or(std::env::var(name).ok().as_deref(), name, default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    parse_or(std::env::var(name).ok().as_deref(), name, default)
}

fn env_i64(name: &str, default: i64) -> i64 {
    parse_or(std::env::var(name).ok().as_deref(), name, default)
}

fn parse_or<T: std::str::FromStr + Copy>(value: Option<&str>, name: &str, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(name, raw, "invalid value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_or_accepts_valid_values() {
        assert_eq!(parse_or(Some("250"), "X", 5u64), 250);
        assert_eq!(parse_or(Some(" 7 "), "X", 5u32), 7);
        assert_eq!(parse_or(Some("-100"), "X", 0i64), -100);
    }

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or(Some("soon"), "X", 5u64), 5);
        assert_eq!(parse_or(None, "X", 5u64), 5);
        assert_eq!(parse_or(Some(""), "X", 5u64), 5);
    }

    #[test]
    fn test_negative_ttl_clamps_to_zero() {
        let ttl = parse_or(Some("-500"), "DEDUP_TTL_MS", 600_000i64).max(0) as u64;
        assert_eq!(ttl, 0);
    }
}
