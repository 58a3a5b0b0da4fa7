//! Distribution of dynamic call sites by number of resolved targets

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSiteDistribution {
    pub unreachable: usize,  // no target
    pub monomorphic: usize,  // exactly one target
    pub polymorphic: usize,  // 2..=MEGAMORPHIC_THRESHOLD targets
    pub megamorphic: usize,  // more than MEGAMORPHIC_THRESHOLD targets
}

/// Sites with more targets than this are counted as megamorphic.
pub const MEGAMORPHIC_THRESHOLD: usize = 4;

impl CallSiteDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, targets: usize) {
        match targets {
            0 => self.unreachable += 1,
            1 => self.monomorphic += 1,
            2..=MEGAMORPHIC_THRESHOLD => self.polymorphic += 1,
            _ => self.megamorphic += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.unreachable + self.monomorphic + self.polymorphic + self.megamorphic
    }

    /// Percentage of reached call sites with a single target.
    pub fn monomorphic_percentage(&self) -> f64 {
        let reached = self.total() - self.unreachable;
        if reached == 0 {
            return 100.0;
        }
        (self.monomorphic as f64 / reached as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_buckets() {
        let mut distribution = CallSiteDistribution::new();
        for targets in [0, 1, 1, 2, 4, 5] {
            distribution.add(targets);
        }

        assert_eq!(distribution.unreachable, 1);
        assert_eq!(distribution.monomorphic, 2);
        assert_eq!(distribution.polymorphic, 2);
        assert_eq!(distribution.megamorphic, 1);
        assert_eq!(distribution.monomorphic_percentage(), 40.0);
    }

    #[test]
    fn test_empty_distribution_is_fully_monomorphic() {
        assert_eq!(CallSiteDistribution::new().monomorphic_percentage(), 100.0);
    }

    proptest! {
        #[test]
        fn prop_every_site_lands_in_one_bucket(targets in prop::collection::vec(0usize..10, 0..50)) {
            let mut distribution = CallSiteDistribution::new();
            for &count in &targets {
                distribution.add(count);
            }
            prop_assert_eq!(distribution.total(), targets.len());
            let percentage = distribution.monomorphic_percentage();
            prop_assert!((0.0..=100.0).contains(&percentage));
        }
    }
}
