//! Error types.
//!
//! Only configuration problems are errors. Intents that arrive in the
//! wrong state (revealing a matched card, pausing a stopped game) are
//! no-ops, not failures.

use thiserror::Error;

/// Errors surfaced to the code that builds or hosts a session.
#[derive(Debug, Error)]
pub enum GameError {
    /// The grid shape or timing cannot produce a playable session.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// A TOML configuration document failed to parse.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The session task behind a handle has stopped.
    #[error("session task is no longer running")]
    SessionClosed,
}

impl GameError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// True for `InvalidConfiguration`.
    #[must_use]
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }
}

/// Crate-wide result alias.
pub type Result<T, E = GameError> = std::result::Result<T, E>;
