//! Deterministic random number generation for bootstrap resampling.
//!
//! One `BootRng` instance is created per verification run and threaded by
//! mutable reference through every orchestrator call. Its state advances with
//! every draw and is never reset mid-run, so a fixed seed together with a
//! fixed sequence of orchestrator calls reproduces bit-identical intervals.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Pseudo-random generator handle shared across a verification run.
///
/// Wraps ChaCha20, which gives a portable, platform-independent stream for a
/// given seed. Reproducibility of bootstrap intervals depends on call order,
/// so callers must not interleave draws from other sources.
#[derive(Clone, Debug)]
pub struct BootRng {
    rng: ChaCha20Rng,
    seed: Option<u64>,
}

impl BootRng {
    /// Create a generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
            seed: None,
        }
    }

    /// Create a generator with a fixed seed for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// The seed this generator was created with, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Draw a uniform index in `[0, n)`.
    #[inline]
    pub fn index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0, "cannot draw an index from an empty population");
        self.rng.gen_range(0..n)
    }
}
