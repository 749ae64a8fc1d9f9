//! Preamble selection strategies

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chooses which of the `count` preambles to transmit
pub trait PreambleSelector {
    /// Return an index in `[0, count)`
    fn select(&mut self, count: usize) -> i64;
}

/// Always returns the same caller-chosen index
#[derive(Debug, Clone, Copy)]
pub struct FixedSelector(pub i64);

impl PreambleSelector for FixedSelector {
    fn select(&mut self, _count: usize) -> i64 {
        self.0
    }
}

/// Uniform random selection from an explicitly seeded generator
#[derive(Debug, Clone)]
pub struct SeededRandomSelector {
    rng: StdRng,
}

impl SeededRandomSelector {
    /// Create a selector from a seed
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl PreambleSelector for SeededRandomSelector {
    fn select(&mut self, count: usize) -> i64 {
        if count == 0 {
            return 0;
        }
        self.rng.gen_range(0..count) as i64
    }
}
