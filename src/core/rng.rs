//! Deterministic random number generation for grid shuffles.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical grids
//! - **Swappable**: Shuffling only needs a `RandomSource`, so tests can
//!   script the exact swap sequence
//! - **Serializable**: O(1) state capture and restore
//!
//! ```
//! use pairs_engine::core::{GameRng, RandomSource};
//!
//! let mut a = GameRng::new(42);
//! let mut b = GameRng::new(42);
//!
//! assert_eq!(a.index_inclusive(9), b.index_inclusive(9));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Source of uniform indices.
///
/// The only primitive a Fisher–Yates shuffle needs.
pub trait RandomSource {
    /// Uniformly random index in `0..=upper`.
    ///
    /// Shuffles clamp anything larger to `upper`.
    fn index_inclusive(&mut self, upper: usize) -> usize;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn index_inclusive(&mut self, upper: usize) -> usize {
        (**self).index_inclusive(upper)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn index_inclusive(&mut self, upper: usize) -> usize {
        (**self).index_inclusive(upper)
    }
}

/// Seedable RNG used for grid generation.
///
/// Uses ChaCha8 for speed while keeping good statistical quality.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create an RNG seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    /// Seed this RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

impl RandomSource for GameRng {
    fn index_inclusive(&mut self, upper: usize) -> usize {
        self.inner.gen_range(0..=upper)
    }
}

/// Serializable RNG state for checkpointing.
///
/// Uses the ChaCha8 word position so capture is O(1) regardless of
/// how many shuffles have run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRngState {
    /// Seed the RNG was created with
    pub seed: u64,
    /// ChaCha8 word position (128-bit counter)
    pub word_pos: u128,
}
