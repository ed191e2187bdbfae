//! Paired card sequence generation.
//!
//! Identities `1..=total_pairs` are laid down twice each and then
//! permuted with a Fisher–Yates shuffle driven by the injected
//! `RandomSource`. Every permutation is equally likely as long as the
//! source is uniform.

use tracing::trace;

use crate::core::{Card, CardIdentity, GameError, RandomSource, Result};

/// Builds shuffled, paired card sequences.
#[derive(Clone, Copy, Debug, Default)]
pub struct GridGenerator;

impl GridGenerator {
    /// Generate `2 * total_pairs` face-down cards.
    ///
    /// Fails with `InvalidConfiguration` when `total_pairs` is zero.
    pub fn generate<R>(total_pairs: usize, rng: &mut R) -> Result<Vec<Card>>
    where
        R: RandomSource + ?Sized,
    {
        if total_pairs < 1 {
            return Err(GameError::invalid("a grid needs at least one pair"));
        }
        let max_identity = u32::try_from(total_pairs)
            .map_err(|_| GameError::invalid(format!("{total_pairs} pairs is too many")))?;

        let mut cards = Vec::with_capacity(total_pairs * 2);
        for id in 1..=max_identity {
            cards.push(Card::new(CardIdentity::new(id)));
            cards.push(Card::new(CardIdentity::new(id)));
        }

        fisher_yates(&mut cards, rng);
        trace!(total_pairs, "generated card sequence");
        Ok(cards)
    }
}

/// Uniform in-place shuffle: walk from the last index down to 1 and swap
/// each slot with a random slot in `0..=i`.
///
/// An out-of-range index from the source is clamped to `i`.
pub fn fisher_yates<T, R>(items: &mut [T], rng: &mut R)
where
    R: RandomSource + ?Sized,
{
    for i in (1..items.len()).rev() {
        let j = rng.index_inclusive(i).min(i);
        items.swap(i, j);
    }
}
