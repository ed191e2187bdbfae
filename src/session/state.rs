//! Session lifecycle state and read-only views.

use serde::{Deserialize, Serialize};

use crate::core::{CardIdentity, CardState};
use crate::grid::Grid;

/// Generation number of a session. Bumped on every `start()`.
///
/// Deferred actions carry the id of the session that scheduled them and
/// are dropped once a newer session exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

/// How a finished session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
}

impl Outcome {
    /// End-of-game message shown to the player.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Outcome::Won => "Congratulations! You won!",
            Outcome::Lost => "Game over! Time ran out.",
        }
    }
}

/// Lifecycle state. `Ended` is left only through a fresh `start()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    NotStarted,
    Running,
    Paused,
    Ended(Outcome),
}

impl SessionState {
    #[must_use]
    pub fn is_running(self) -> bool {
        self == SessionState::Running
    }

    #[must_use]
    pub fn is_ended(self) -> bool {
        matches!(self, SessionState::Ended(_))
    }

    /// Outcome if the session has ended.
    #[must_use]
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            SessionState::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Per-session counters. Reset by `start()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Reveals that were accepted.
    pub reveals: u32,
    /// Pairs found.
    pub matches: u32,
    /// Turns that ended in a mismatch.
    pub mismatches: u32,
    /// Countdown ticks processed while running.
    pub ticks: u32,
}

impl SessionStats {
    /// Share of completed turns that found a pair, 0-100.
    #[must_use]
    pub fn precision_pct(&self) -> u8 {
        let turns = self.matches + self.mismatches;
        if turns == 0 {
            return 0;
        }
        ((self.matches as u64 * 100) / turns as u64) as u8
    }
}

/// A card as the player sees it. Hidden identities are not exposed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardFace {
    Hidden,
    Revealed(CardIdentity),
    Matched(CardIdentity),
}

impl CardFace {
    fn of(state: CardState, identity: CardIdentity) -> Self {
        match state {
            CardState::Hidden => CardFace::Hidden,
            CardState::Revealed => CardFace::Revealed(identity),
            CardState::Matched => CardFace::Matched(identity),
        }
    }
}

/// Serializable view of the current session, suitable for re-syncing a
/// renderer from scratch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: Option<SessionId>,
    pub state: SessionState,
    pub remaining_secs: u32,
    pub match_count: usize,
    pub total_pairs: usize,
    pub columns: u32,
    pub rows: u32,
    pub faces: Vec<CardFace>,
    pub stats: SessionStats,
}

pub(crate) fn faces_of(grid: &Grid) -> Vec<CardFace> {
    grid.cards()
        .iter()
        .map(|c| CardFace::of(c.state, c.identity))
        .collect()
}
