//! Core types: cards, configuration, errors, RNG.
//!
//! Everything here is independent of session timing and can be used
//! without the controller.

pub mod card;
pub mod config;
pub mod error;
pub mod rng;

pub use card::{Card, CardIdentity, CardRef, CardState};
pub use config::{SessionConfig, Theme};
pub use error::{GameError, Result};
pub use rng::{GameRng, GameRngState, RandomSource};
