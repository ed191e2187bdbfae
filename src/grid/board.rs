//! The card grid of one session.
//!
//! The shape is fixed at construction. Only card states change during
//! play, and only through the session controller (`get_mut` is
//! crate-private).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::generator::GridGenerator;
use crate::core::{Card, CardIdentity, CardRef, CardState, GameError, RandomSource, Result, SessionConfig};

/// Ordered sequence of `columns * rows` cards, row-major.
///
/// Deserializing goes through `from_cards`, so a decoded grid is always
/// well paired.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridLayout")]
pub struct Grid {
    columns: u32,
    rows: u32,
    cards: Vec<Card>,
}

/// Unchecked wire form of a `Grid`.
#[derive(Deserialize)]
struct GridLayout {
    columns: u32,
    rows: u32,
    cards: Vec<Card>,
}

impl TryFrom<GridLayout> for Grid {
    type Error = GameError;

    fn try_from(layout: GridLayout) -> Result<Self> {
        Self::from_cards(layout.columns, layout.rows, layout.cards)
    }
}

impl Grid {
    /// Validate `config` and deal a freshly shuffled grid.
    ///
    /// No grid is built when the configuration is invalid.
    pub fn generate<R>(config: &SessionConfig, rng: &mut R) -> Result<Self>
    where
        R: RandomSource + ?Sized,
    {
        config.validate()?;
        let cards = GridGenerator::generate(config.total_pairs(), rng)?;
        Ok(Self {
            columns: config.columns,
            rows: config.rows,
            cards,
        })
    }

    /// Build a grid from a known card layout.
    ///
    /// The layout must fill the shape exactly and every identity must
    /// appear exactly twice.
    pub fn from_cards(columns: u32, rows: u32, cards: Vec<Card>) -> Result<Self> {
        let grid = Self {
            columns,
            rows,
            cards,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Check the shape and pairing invariants.
    pub fn validate(&self) -> Result<()> {
        let (columns, rows) = (self.columns, self.rows);
        let expected = columns as usize * rows as usize;
        if expected == 0 || expected % 2 != 0 {
            return Err(GameError::invalid(format!(
                "grid {columns}x{rows} cannot hold pairs"
            )));
        }
        if self.cards.len() != expected {
            return Err(GameError::invalid(format!(
                "grid {columns}x{rows} needs {expected} cards, got {}",
                self.cards.len()
            )));
        }
        if !self.is_well_paired() {
            return Err(GameError::invalid("every identity must appear exactly twice"));
        }
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn total_pairs(&self) -> usize {
        self.cards.len() / 2
    }

    /// Get a card, `None` if the reference is off the grid.
    #[must_use]
    pub fn get(&self, card: CardRef) -> Option<&Card> {
        self.cards.get(card.index())
    }

    pub(crate) fn get_mut(&mut self, card: CardRef) -> Option<&mut Card> {
        self.cards.get_mut(card.index())
    }

    pub(crate) fn set_state(&mut self, card: CardRef, state: CardState) {
        if let Some(c) = self.get_mut(card) {
            c.state = state;
        }
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Iterate `(CardRef, &Card)` in grid order.
    pub fn iter(&self) -> impl Iterator<Item = (CardRef, &Card)> {
        self.cards.iter().enumerate().map(|(i, c)| (CardRef::new(i), c))
    }

    /// `(column, row)` of a card.
    #[must_use]
    pub fn position(&self, card: CardRef) -> Option<(u32, u32)> {
        if card.index() >= self.cards.len() || self.columns == 0 {
            return None;
        }
        let columns = self.columns as usize;
        Some(((card.index() % columns) as u32, (card.index() / columns) as u32))
    }

    /// Count of cards in the given state.
    #[must_use]
    pub fn count_in(&self, state: CardState) -> usize {
        self.cards.iter().filter(|c| c.state == state).count()
    }

    #[must_use]
    pub fn all_matched(&self) -> bool {
        self.cards.iter().all(Card::is_matched)
    }

    /// Occurrences of each identity.
    #[must_use]
    pub fn identity_tally(&self) -> FxHashMap<CardIdentity, usize> {
        let mut tally = FxHashMap::default();
        for card in &self.cards {
            *tally.entry(card.identity).or_insert(0) += 1;
        }
        tally
    }

    /// Every identity in `1..=total_pairs` occurs exactly twice.
    #[must_use]
    pub fn is_well_paired(&self) -> bool {
        let tally = self.identity_tally();
        let pairs = self.total_pairs();
        tally.len() == pairs
            && (1..=pairs as u32).all(|id| tally.get(&CardIdentity::new(id)) == Some(&2))
    }
}
