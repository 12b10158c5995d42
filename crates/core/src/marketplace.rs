//! Marketplace identifiers and listing ids.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketplace identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Marketplace {
    Portal = 1,
    Mrkt = 2,
}

impl Marketplace {
    /// All supported marketplaces.
    pub fn all() -> [Marketplace; 2] {
        [Marketplace::Portal, Marketplace::Mrkt]
    }

    pub fn name(self) -> &'static str {
        match self {
            Marketplace::Portal => "Portal",
            Marketplace::Mrkt => "MRKT",
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Listing identifier, namespaced by marketplace.
///
/// A Portal id and an MRKT id are never reconciled even when they refer
/// to the same physical gift; dedup treats them as distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId {
    pub marketplace: Marketplace,
    pub raw: CompactString,
}

impl ListingId {
    pub fn new(marketplace: Marketplace, raw: &str) -> Self {
        Self {
            marketplace,
            raw: CompactString::new(raw),
        }
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.marketplace.name(), self.raw)
    }
}
