//! Source of the uniform draw used to pick a host.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws an index uniformly from `0..upper`.
///
/// Host selection always goes through a [`Sampler`] so that tests can
/// substitute a scripted sequence without changing the selection algorithm.
pub trait Sampler: Send {
    /// Return an index in `0..upper`. `upper` is never zero.
    fn sample(&mut self, upper: usize) -> usize;
}

/// Default [`Sampler`] backed by [`StdRng`].
#[derive(Debug)]
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    /// A sampler seeded from the operating system's entropy source.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// A reproducible sampler.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Sampler for RandomSampler {
    fn sample(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }
}
