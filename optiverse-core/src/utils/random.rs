#[cfg(test)]
#[path = "../../tests/unit/utils/random_test.rs"]
mod random_test;

use rand::prelude::*;
use rand::rngs::SmallRng;
use std::cell::RefCell;

/// Provides the way to use randomized values in generic way.
pub trait Random {
    /// Produces real random value, uniformly distributed on the closed interval [min, max).
    fn uniform_real(&self, min: f64, max: f64) -> f64;

    /// Returns an index from collection with probability proportional to its weight.
    fn weighted(&self, weights: &[f64]) -> usize;

    /// Picks up to `amount` distinct indices from `0..size` in random order.
    fn sample_indices(&self, size: usize, amount: usize) -> Vec<usize>;
}

/// A random implementation which is fully determined by its seed, so the same input always
/// produces the same choices.
pub struct SeededRandom {
    rng: RefCell<SmallRng>,
}

impl SeededRandom {
    /// Creates a new instance of `SeededRandom`.
    pub fn new(seed: u64) -> Self {
        Self { rng: RefCell::new(SmallRng::seed_from_u64(seed)) }
    }
}

impl Random for SeededRandom {
    fn uniform_real(&self, min: f64, max: f64) -> f64 {
        if (min - max).abs() < f64::EPSILON || min > max {
            return min;
        }

        self.rng.borrow_mut().gen_range(min..max)
    }

    fn weighted(&self, weights: &[f64]) -> usize {
        let total = weights.iter().filter(|weight| **weight > 0.).sum::<f64>();
        if total <= 0. {
            return 0;
        }

        let mut threshold = self.uniform_real(0., total);

        weights
            .iter()
            .position(|&weight| {
                if weight <= 0. {
                    return false;
                }
                threshold -= weight;
                threshold < 0.
            })
            .or_else(|| weights.iter().rposition(|&weight| weight > 0.))
            .unwrap_or(0)
    }

    fn sample_indices(&self, size: usize, amount: usize) -> Vec<usize> {
        let mut indices = (0..size).collect::<Vec<_>>();
        indices.shuffle(&mut *self.rng.borrow_mut());
        indices.truncate(amount);

        indices
    }
}
