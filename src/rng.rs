//! Random number generation for mine placement.
//!
//! Uses the `rand` crate with `SmallRng` (xoshiro256++), which is fast
//! and works on WASM. Entropy is sourced from `getrandom` (browser crypto
//! API on wasm32, the OS elsewhere).

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A seedable RNG for board layout.
///
/// Can be seeded for deterministic replay, or created from system entropy.
pub struct GameRng {
    inner: SmallRng,
}

impl GameRng {
    /// Create from system entropy.
    pub fn new() -> Self {
        Self {
            inner: SmallRng::from_os_rng(),
        }
    }

    /// Create with a specific seed for deterministic behavior.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// Generate a random usize in [0, max).
    #[inline(always)]
    pub fn gen_range(&mut self, max: usize) -> usize {
        self.inner.random_range(0..max)
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new()
    }
}
