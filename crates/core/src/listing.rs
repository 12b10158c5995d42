//! Listings and trade history entries.

use crate::{ListingId, Ton};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A single tradable gift instance offered at a price on a marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    /// Gift collection name (e.g., "Plush Pepe").
    pub gift: CompactString,
    /// Model attribute, when the marketplace exposes one.
    pub model: Option<CompactString>,
    /// Backdrop attribute, when the marketplace exposes one.
    pub backdrop: Option<CompactString>,
    pub price: Ton,
}

/// One historical sale of a gift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub gift_id: CompactString,
    pub price: Ton,
    /// Sale timestamp in epoch milliseconds.
    pub at_ms: u64,
}

/// Listing sort order requested from a marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Cheapest first. The only order the scan cycles consume.
    PriceAscending,
}
