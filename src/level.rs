//! Level sampling.
//!
//! Every insertion draws a level for the new node: start at lane 0 and keep
//! climbing while a uniform draw lands strictly below the promotion
//! probability, never past `max_level`. The draws come from a
//! [`UniformSource`], so tests can replay exact sequences.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// A stream of uniform draws in `[0, 1)`.
pub trait UniformSource {
    fn next_unit(&mut self) -> f64;
}

/// Draws from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Same seed, same levels.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl Default for RngSource<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: Rng> UniformSource for RngSource<R> {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Hands back a fixed list of draws in order.
///
/// Once the list runs dry every draw is `1.0`, which never promotes.
#[derive(Debug, Clone, Default)]
pub struct Replay {
    draws: VecDeque<f64>,
}

impl Replay {
    pub fn new<I: IntoIterator<Item = f64>>(draws: I) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }

    /// Queue more draws behind the ones not consumed yet.
    pub fn push<I: IntoIterator<Item = f64>>(&mut self, draws: I) {
        self.draws.extend(draws);
    }

    /// Drop whatever is left and replay `draws` instead.
    pub fn reset<I: IntoIterator<Item = f64>>(&mut self, draws: I) {
        self.draws.clear();
        self.draws.extend(draws);
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl UniformSource for Replay {
    fn next_unit(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(1.0)
    }
}

impl<F: FnMut() -> f64> UniformSource for F {
    fn next_unit(&mut self) -> f64 {
        (*self)()
    }
}

/// Turns uniform draws into node levels in `[0, max_level]`.
#[derive(Debug, Clone)]
pub struct LevelSampler<S> {
    promotion_probability: f64,
    max_level: usize,
    source: S,
}

impl<S: UniformSource> LevelSampler<S> {
    pub(crate) fn new(promotion_probability: f64, max_level: usize, source: S) -> Self {
        Self {
            promotion_probability,
            max_level,
            source,
        }
    }

    /// The ceiling is checked before drawing, so a sampler with
    /// `max_level == 0` never consumes a draw.
    pub fn sample(&mut self) -> usize {
        let mut level = 0;
        while level < self.max_level && self.source.next_unit() < self.promotion_probability {
            level += 1;
        }
        level
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
