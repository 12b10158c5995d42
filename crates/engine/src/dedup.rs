//! TTL-based notification dedup.

use crate::clock::Clock;
use dashmap::DashMap;
use giftwatch_core::{ListingId, UserId};

/// Per-user set of already-notified listing ids with sliding expiry.
///
/// An entry suppresses re-notification of a still-listed item for the
/// TTL window; once the entry expires, a relisted (or still present)
/// item becomes eligible again. TTL 0 means "never dedup".
pub struct DedupCache {
    ttl_ms: u64,
    entries: DashMap<(UserId, ListingId), u64>,
}

impl DedupCache {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            ttl_ms,
            entries: DashMap::new(),
        }
    }

    /// True iff no live entry exists for this user/listing pair.
    /// An entry is live strictly while `now_ms < expires_at`.
    pub fn should_notify(&self, user: UserId, listing: &ListingId, now_ms: u64) -> bool {
        if self.ttl_ms == 0 {
            return true;
        }
        let key = (user, listing.clone());
        if let Some(expires_at) = self.entries.get(&key) {
            if now_ms < *expires_at {
                return false;
            }
        }
        // Lazy purge of the expired entry
        self.entries.remove_if(&key, |_, expires_at| now_ms >= *expires_at);
        true
    }

    /// Record a delivered notification. Overwrites any prior entry.
    pub fn mark_notified(&self, user: UserId, listing: ListingId, now_ms: u64) {
        if self.ttl_ms == 0 {
            return;
        }
        self.entries.insert((user, listing), now_ms + self.ttl_ms);
    }

    /// Drop all expired entries. Run at the start of a cycle so the map
    /// does not accumulate entries for listings never looked up again.
    pub fn sweep(&self, now_ms: u64) {
        self.entries.retain(|_, expires_at| now_ms < *expires_at);
    }

    /// Convenience wrapper that reads the time from a clock.
    pub fn sweep_with(&self, clock: &dyn Clock) {
        self.sweep(clock.now_ms());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
