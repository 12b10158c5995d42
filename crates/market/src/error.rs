//! Error types for marketplace operations.

use giftwatch_core::Marketplace;
use thiserror::Error;

/// Errors from listing search and history fetches.
///
/// A gateway error always means "this cycle learned nothing" for the
/// affected user or subscription; it is never interpreted as an empty
/// result set.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{marketplace} request failed: {message}")]
    Http {
        marketplace: Marketplace,
        message: String,
    },

    #[error("{marketplace} returned HTTP {status}")]
    Status {
        marketplace: Marketplace,
        status: u16,
    },

    #[error("{marketplace} response could not be decoded: {message}")]
    Decode {
        marketplace: Marketplace,
        message: String,
    },

    #[error("{marketplace} request timed out")]
    Timeout { marketplace: Marketplace },

    #[error("all marketplace sources failed")]
    AllSourcesFailed,
}

impl GatewayError {
    pub fn from_reqwest(marketplace: Marketplace, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout { marketplace }
        } else if err.is_decode() {
            GatewayError::Decode {
                marketplace,
                message: err.to_string(),
            }
        } else {
            GatewayError::Http {
                marketplace,
                message: err.to_string(),
            }
        }
    }

    /// Returns true if this error is transient and likely to succeed on
    /// the next cycle without intervention.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Http { .. }
            | GatewayError::Timeout { .. }
            | GatewayError::AllSourcesFailed => true,
            GatewayError::Status { status, .. } => *status == 429 || *status >= 500,
            GatewayError::Decode { .. } => false,
        }
    }
}

/// Errors from the purchase action behind auto-buy.
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("{marketplace} purchase request failed: {message}")]
    Http {
        marketplace: Marketplace,
        message: String,
    },

    #[error("{marketplace} rejected the purchase (HTTP {status})")]
    Rejected {
        marketplace: Marketplace,
        status: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let mp = Marketplace::Portal;
        assert!(GatewayError::Timeout { marketplace: mp }.is_transient());
        assert!(GatewayError::AllSourcesFailed.is_transient());
        assert!(GatewayError::Status { marketplace: mp, status: 503 }.is_transient());
        assert!(GatewayError::Status { marketplace: mp, status: 429 }.is_transient());
        assert!(!GatewayError::Status { marketplace: mp, status: 401 }.is_transient());
        assert!(!GatewayError::Decode { marketplace: mp, message: "eof".into() }.is_transient());
    }
}
