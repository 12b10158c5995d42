//! Per-cycle notification budget.

/// Counter capped at a per-cycle maximum. Once exhausted, remaining
/// candidates in the cycle are skipped, not queued; the next cycle
/// re-evaluates from scratch.
#[derive(Debug)]
pub struct Budget {
    remaining: u32,
}

impl Budget {
    pub fn new(cap: u32) -> Self {
        Self { remaining: cap }
    }

    /// Take one unit of budget; false once the cap is reached.
    pub fn try_take(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    /// Return one unit, for a taken notification that was never
    /// delivered.
    pub fn put_back(&mut self) {
        self.remaining += 1;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_budget_exhaustion() {
        let mut budget = Budget::new(2);
        assert!(budget.try_take());
        assert!(budget.try_take());
        assert!(!budget.try_take());
        assert!(!budget.try_take());
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn test_zero_cap_takes_nothing() {
        let mut budget = Budget::new(0);
        assert!(!budget.try_take());
    }

    #[test]
    fn test_put_back_restores_a_unit() {
        let mut budget = Budget::new(1);
        assert!(budget.try_take());
        budget.put_back();
        assert!(budget.try_take());
        assert!(!budget.try_take());
    }
}
