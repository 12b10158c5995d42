//! Standing subscriptions and their watch state machine.

use crate::{GiftFilter, Ton};
use serde::{Deserialize, Serialize};

/// Per-subscription match-tracking state.
///
/// A single transient empty page from an upstream API must not wipe the
/// known floor, so "no matches" is only trusted after a configured
/// number of consecutive successful empty fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchState {
    /// Matches were seen last cycle; `floor` is the cheapest of them.
    Active { floor: Ton },
    /// Zero matches seen for `streak` consecutive successful cycles,
    /// not yet enough to trust. `floor` keeps the last known value.
    PendingEmpty { floor: Option<Ton>, streak: u32 },
    /// Emptiness confirmed and already reported; floor cleared.
    ConfirmedEmpty,
}

impl Default for WatchState {
    fn default() -> Self {
        WatchState::PendingEmpty {
            floor: None,
            streak: 0,
        }
    }
}

impl WatchState {
    /// Last observed minimum matching price, if still trusted.
    pub fn last_known_floor(&self) -> Option<Ton> {
        match *self {
            WatchState::Active { floor } => Some(floor),
            WatchState::PendingEmpty { floor, .. } => floor,
            WatchState::ConfirmedEmpty => None,
        }
    }

    /// Consecutive successful empty cycles observed so far.
    pub fn empty_streak(&self) -> u32 {
        match *self {
            WatchState::PendingEmpty { streak, .. } => streak,
            _ => 0,
        }
    }

    /// Apply a successful fetch that returned at least one match.
    /// Returns the next state and whether the floor changed.
    pub fn on_matches(&self, floor: Ton) -> (WatchState, bool) {
        let changed = self.last_known_floor() != Some(floor);
        (WatchState::Active { floor }, changed)
    }

    /// Apply a successful fetch that returned zero matches.
    ///
    /// Returns the next state and whether this cycle crossed the
    /// confirmation threshold with a previously known floor, i.e.
    /// whether a "lost all matches" report is due. The report fires at
    /// most once per emptiness episode.
    pub fn on_empty(&self, confirm_threshold: u32) -> (WatchState, bool) {
        let (floor, streak) = match *self {
            WatchState::Active { floor } => (Some(floor), 1),
            WatchState::PendingEmpty { floor, streak } => (floor, streak + 1),
            WatchState::ConfirmedEmpty => return (WatchState::ConfirmedEmpty, false),
        };
        if streak >= confirm_threshold {
            (WatchState::ConfirmedEmpty, floor.is_some())
        } else {
            (WatchState::PendingEmpty { floor, streak }, false)
        }
    }
}

/// A standing, user-defined watch with its own filter and state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Opaque unique id, stable across restarts.
    pub id: String,
    pub enabled: bool,
    pub filter: GiftFilter,
    pub max_price: Option<Ton>,
    pub watch: WatchState,
}

impl Subscription {
    pub fn new(id: impl Into<String>, filter: GiftFilter, max_price: Option<Ton>) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            filter,
            max_price,
            watch: WatchState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_matches_reset_streak_and_track_floor() {
        let state = WatchState::PendingEmpty {
            floor: Some(Ton::from_f64(4.0)),
            streak: 1,
        };
        let (next, changed) = state.on_matches(Ton::from_f64(3.5));
        assert_eq!(
            next,
            WatchState::Active {
                floor: Ton::from_f64(3.5)
            }
        );
        assert!(changed);
        assert_eq!(next.empty_streak(), 0);

        // Same floor again is not a change
        let (next, changed) = next.on_matches(Ton::from_f64(3.5));
        assert!(!changed);
        assert_eq!(next.last_known_floor(), Some(Ton::from_f64(3.5)));
    }

    #[test]
    fn test_empty_confirmation_threshold() {
        // Threshold 2: first empty cycle is pending, second confirms and
        // reports, third is silent.
        let state = WatchState::Active {
            floor: Ton::from_f64(4.0),
        };

        let (state, lost) = state.on_empty(2);
        assert_eq!(state.empty_streak(), 1);
        assert_eq!(state.last_known_floor(), Some(Ton::from_f64(4.0)));
        assert!(!lost);

        let (state, lost) = state.on_empty(2);
        assert_eq!(state, WatchState::ConfirmedEmpty);
        assert!(lost);
        assert_eq!(state.last_known_floor(), None);

        let (state, lost) = state.on_empty(2);
        assert_eq!(state, WatchState::ConfirmedEmpty);
        assert!(!lost);
    }

    #[test]
    fn test_fresh_subscription_never_reports_loss() {
        // No floor was ever known, so confirming emptiness says nothing.
        let state = WatchState::default();
        let (state, lost) = state.on_empty(1);
        assert_eq!(state, WatchState::ConfirmedEmpty);
        assert!(!lost);
    }

    #[test]
    fn test_threshold_one_confirms_immediately() {
        let state = WatchState::Active {
            floor: Ton::from_f64(2.0),
        };
        let (state, lost) = state.on_empty(1);
        assert_eq!(state, WatchState::ConfirmedEmpty);
        assert!(lost);
    }

    #[test]
    fn test_recovery_from_confirmed_empty() {
        let (state, changed) = WatchState::ConfirmedEmpty.on_matches(Ton::from_f64(9.0));
        assert_eq!(
            state,
            WatchState::Active {
                floor: Ton::from_f64(9.0)
            }
        );
        assert!(changed);
    }
}
