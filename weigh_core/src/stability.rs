//! Consecutive-identical-reading stability detection.
//!
//! Equality is exact on the decimal value (`Weight` compares normalized
//! units), never on binary floating point and never within a tolerance.
use crate::weight::Weight;

/// Identical readings in a row required by default.
pub const DEFAULT_STABLE_COUNT: u32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StabilityState {
    pub last_weight: Option<Weight>,
    pub same_count: u32,
}

/// Result of feeding one reading to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Not stable yet; `same_count` identical readings so far.
    Settling { same_count: u32 },
    /// Threshold reached. Emitted once per activation.
    Stabilized(Weight),
    /// Already stabilized; waiting for `reset`.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct StabilityTracker {
    threshold: u32,
    state: StabilityState,
    settled: bool,
}

impl Default for StabilityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_STABLE_COUNT)
    }
}

impl StabilityTracker {
    /// A threshold of 0 is treated as 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            state: StabilityState::default(),
            settled: false,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn state(&self) -> StabilityState {
        self.state
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn observe(&mut self, weight: Weight) -> Observation {
        if self.settled {
            return Observation::Ignored;
        }
        if self.state.last_weight == Some(weight) {
            self.state.same_count = self.state.same_count.saturating_add(1);
        } else {
            self.state.last_weight = Some(weight);
            self.state.same_count = 1;
        }
        if self.state.same_count >= self.threshold {
            self.settled = true;
            return Observation::Stabilized(weight);
        }
        Observation::Settling {
            same_count: self.state.same_count,
        }
    }

    pub fn reset(&mut self) {
        self.state = StabilityState::default();
        self.settled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(s: &str) -> Weight {
        s.parse().unwrap()
    }

    #[test]
    fn fifth_identical_reading_stabilizes() {
        let mut t = StabilityTracker::default();
        for n in 1..=4 {
            assert_eq!(
                t.observe(w("50.0")),
                Observation::Settling { same_count: n }
            );
        }
        assert_eq!(t.observe(w("50.0")), Observation::Stabilized(w("50.0")));
        assert_eq!(t.observe(w("50.0")), Observation::Ignored);
    }

    #[test]
    fn a_different_value_restarts_the_count() {
        let mut t = StabilityTracker::new(3);
        t.observe(w("1.0"));
        t.observe(w("1.0"));
        assert_eq!(t.observe(w("1.1")), Observation::Settling { same_count: 1 });
        assert_eq!(
            t.state(),
            StabilityState {
                last_weight: Some(w("1.1")),
                same_count: 1
            }
        );
    }

    #[test]
    fn precision_differences_are_not_changes() {
        let mut t = StabilityTracker::new(2);
        t.observe(w("50.0"));
        assert_eq!(t.observe(w("50.00")), Observation::Stabilized(w("50")));
    }

    #[test]
    fn reset_clears_state_and_quiescence() {
        let mut t = StabilityTracker::new(1);
        assert!(matches!(t.observe(w("2")), Observation::Stabilized(_)));
        assert!(t.is_settled());
        t.reset();
        assert_eq!(t.state(), StabilityState::default());
        assert!(!t.is_settled());
        assert!(matches!(t.observe(w("3")), Observation::Stabilized(_)));
    }

    #[test]
    fn zero_threshold_behaves_like_one() {
        assert_eq!(StabilityTracker::new(0).threshold(), 1);
    }
}
