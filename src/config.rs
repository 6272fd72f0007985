use crate::error::{Result, SkipListError};

/// Chance that a freshly inserted node is promoted one more lane.
pub const DEFAULT_PROMOTION_PROBABILITY: f64 = 0.5;

/// Highest lane index a node may ever reach.
pub const DEFAULT_MAX_LEVEL: i64 = 32;

/// Construction parameters of a [`SkipList`](crate::SkipList).
///
/// Both values are fixed once the list is built. `max_level` is signed so a
/// negative request can be reported instead of silently wrapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub promotion_probability: f64,
    pub max_level: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            promotion_probability: DEFAULT_PROMOTION_PROBABILITY,
            max_level: DEFAULT_MAX_LEVEL,
        }
    }
}

impl Config {
    pub fn with_promotion_probability(mut self, promotion_probability: f64) -> Self {
        self.promotion_probability = promotion_probability;
        self
    }

    pub fn with_max_level(mut self, max_level: i64) -> Self {
        self.max_level = max_level;
        self
    }

    /// Check both parameters. NaN is not a valid probability.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.promotion_probability) {
            return Err(SkipListError::InvalidProbability(
                self.promotion_probability,
            ));
        }
        if self.max_level < 0 {
            return Err(SkipListError::InvalidMaxLevel(self.max_level));
        }
        Ok(())
    }
}
