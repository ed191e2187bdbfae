//! Card identification and per-card state.
//!
//! A card has two independent facts attached to it:
//! - its `CardIdentity`, the match key shared with exactly one other card
//! - its `CardState`, which the session controller flips during play
//!
//! Cards are addressed by `CardRef`, their position in the grid.
//!
//! ```
//! use pairs_engine::core::{Card, CardIdentity, CardState};
//!
//! let mut card = Card::new(CardIdentity::new(3));
//! assert_eq!(card.state, CardState::Hidden);
//!
//! card.state = CardState::Revealed;
//! assert!(card.is_face_up());
//! ```

use serde::{Deserialize, Serialize};

/// Match key. Two cards with the same identity form a pair.
///
/// Values live in `1..=total_pairs` for a generated grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardIdentity(pub u32);

impl CardIdentity {
    /// Create a new card identity.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw identity value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of a card in the grid, row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardRef(pub usize);

impl CardRef {
    /// Create a card reference from a grid index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the grid index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Reference for the card at `(column, row)` in a grid `columns` wide.
    #[must_use]
    pub const fn at(column: usize, row: usize, columns: usize) -> Self {
        Self(row * columns + column)
    }
}

impl std::fmt::Display for CardRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Face state of a card.
///
/// `Hidden` and `Revealed` toggle during unresolved turns.
/// `Matched` is terminal for the rest of the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardState {
    #[default]
    Hidden,
    Revealed,
    Matched,
}

/// A single card on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Match key, fixed for the lifetime of the session.
    pub identity: CardIdentity,
    /// Current face state.
    pub state: CardState,
}

impl Card {
    /// Create a face-down card.
    #[must_use]
    pub const fn new(identity: CardIdentity) -> Self {
        Self {
            identity,
            state: CardState::Hidden,
        }
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.state == CardState::Hidden
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.state == CardState::Matched
    }

    /// Revealed or matched: the player can see the identity.
    #[must_use]
    pub fn is_face_up(&self) -> bool {
        self.state != CardState::Hidden
    }

    /// Identity as the player sees it. `None` while face down.
    #[must_use]
    pub fn visible_identity(&self) -> Option<CardIdentity> {
        self.is_face_up().then_some(self.identity)
    }
}
