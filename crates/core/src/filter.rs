//! Gift attribute filters.

use crate::Listing;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Attribute filter for listings.
///
/// An empty `gift` matches every collection; `None` for model/backdrop
/// matches any value of that attribute. Comparisons are ASCII
/// case-insensitive, matching how the marketplaces normalize names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftFilter {
    pub gift: CompactString,
    pub model: Option<CompactString>,
    pub backdrop: Option<CompactString>,
}

impl GiftFilter {
    /// Create a filter on a gift collection name.
    pub fn new(gift: &str) -> Self {
        Self {
            gift: CompactString::new(gift),
            model: None,
            backdrop: None,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(CompactString::new(model));
        self
    }

    pub fn with_backdrop(mut self, backdrop: &str) -> Self {
        self.backdrop = Some(CompactString::new(backdrop));
        self
    }

    /// Check whether a listing matches this filter.
    pub fn matches(&self, listing: &Listing) -> bool {
        if !self.gift.is_empty() && !self.gift.eq_ignore_ascii_case(&listing.gift) {
            return false;
        }
        if let Some(ref model) = self.model {
            match listing.model {
                Some(ref m) if model.eq_ignore_ascii_case(m) => {}
                _ => return false,
            }
        }
        if let Some(ref backdrop) = self.backdrop {
            match listing.backdrop {
                Some(ref b) if backdrop.eq_ignore_ascii_case(b) => {}
                _ => return false,
            }
        }
        true
    }
}

/// How premarket (not yet minted) listings are treated in queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PremarketStatus {
    /// Only listings already on-chain. The fallback for invalid config input.
    #[default]
    Exclude,
    /// Premarket and on-chain listings together.
    Include,
    /// Premarket listings only.
    Only,
}

impl PremarketStatus {
    /// Parse a config value; unknown input falls back to [`PremarketStatus::Exclude`].
    pub fn parse_or_default(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "exclude" => PremarketStatus::Exclude,
            "include" => PremarketStatus::Include,
            "only" => PremarketStatus::Only,
            _ => PremarketStatus::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ListingId, Marketplace, Ton};
    use pretty_assertions::assert_eq;

    fn listing(gift: &str, model: Option<&str>, backdrop: Option<&str>) -> Listing {
        Listing {
            id: ListingId::new(Marketplace::Portal, "1"),
            gift: CompactString::new(gift),
            model: model.map(CompactString::new),
            backdrop: backdrop.map(CompactString::new),
            price: Ton::from_f64(1.0),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = GiftFilter::default();
        assert!(filter.matches(&listing("Plush Pepe", None, None)));
        assert!(filter.matches(&listing("Candy Cane", Some("Classic"), Some("Gold"))));
    }

    #[test]
    fn test_gift_name_is_case_insensitive() {
        let filter = GiftFilter::new("plush pepe");
        assert!(filter.matches(&listing("Plush Pepe", None, None)));
        assert!(!filter.matches(&listing("Candy Cane", None, None)));
    }

    #[test]
    fn test_model_constraint_requires_attribute() {
        let filter = GiftFilter::new("Plush Pepe").with_model("Mint");
        assert!(filter.matches(&listing("Plush Pepe", Some("Mint"), None)));
        assert!(!filter.matches(&listing("Plush Pepe", Some("Coal"), None)));
        // Listing without a model can never satisfy a model constraint
        assert!(!filter.matches(&listing("Plush Pepe", None, None)));
    }

    #[test]
    fn test_backdrop_constraint() {
        let filter = GiftFilter::new("").with_backdrop("Gold");
        assert!(filter.matches(&listing("Anything", None, Some("gold"))));
        assert!(!filter.matches(&listing("Anything", None, Some("Silver"))));
    }

    #[test]
    fn test_premarket_parse_fallback() {
        assert_eq!(PremarketStatus::parse_or_default("include"), PremarketStatus::Include);
        assert_eq!(PremarketStatus::parse_or_default("ONLY"), PremarketStatus::Only);
        assert_eq!(PremarketStatus::parse_or_default("bogus"), PremarketStatus::Exclude);
        assert_eq!(PremarketStatus::parse_or_default(""), PremarketStatus::Exclude);
    }
}
