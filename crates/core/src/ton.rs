//! TON amounts as fixed-point integers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Fixed-point TON amount with 9 decimal places (nanoton).
/// Used for precise price representation without floating-point errors.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Ton(pub u64);

impl Ton {
    /// Number of decimal places (9, matching on-chain nanoton).
    pub const DECIMALS: u32 = 9;
    /// Scale factor: 10^9.
    pub const SCALE: u64 = 1_000_000_000;

    /// Create from f64 (config input and display paths; negatives clamp to zero).
    pub fn from_f64(value: f64) -> Self {
        if value <= 0.0 {
            return Self(0);
        }
        Self((value * Self::SCALE as f64) as u64)
    }

    /// Create from a raw nanoton amount (marketplace wire format).
    pub fn from_nano(nano: u64) -> Self {
        Self(nano)
    }

    /// Convert to f64 (for display/debugging).
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    /// Net proceeds after deducting a marketplace fee given in basis points.
    pub fn after_fee_bps(self, fee_bps: u32) -> Ton {
        let fee = (self.0 as u128 * fee_bps as u128) / 10_000;
        Ton(self.0.saturating_sub(fee as u64))
    }
}

impl Add for Ton {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Ton {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Ton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        if frac == 0 {
            write!(f, "{whole} TON")
        } else {
            let frac = format!("{frac:09}");
            write!(f, "{}.{} TON", whole, frac.trim_end_matches('0'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_f64_round_trip() {
        let price = Ton::from_f64(5.25);
        assert_eq!(price.0, 5_250_000_000);
        assert_eq!(price.to_f64(), 5.25);
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(Ton::from_f64(-1.0), Ton(0));
    }

    #[test]
    fn test_after_fee_bps() {
        // 5% fee on 10 TON leaves 9.5 TON
        let price = Ton::from_f64(10.0);
        assert_eq!(price.after_fee_bps(500), Ton::from_f64(9.5));
        // 0 bps is a no-op
        assert_eq!(price.after_fee_bps(0), price);
    }

    #[test]
    fn test_saturating_sub() {
        assert_eq!(Ton(5) - Ton(10), Ton(0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Ton::from_f64(5.25).to_string(), "5.25 TON");
        assert_eq!(Ton::from_f64(3.0).to_string(), "3 TON");
    }
}
