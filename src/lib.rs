//! # pairs-engine
//!
//! Session engine for a timed memory-matching ("pairs") game.
//!
//! A rectangular grid holds face-down cards, each identity appearing
//! exactly twice. The player turns up two cards per turn looking for
//! pairs before a countdown runs out.
//!
//! ## Design Principles
//!
//! 1. **Single Writer**: `SessionController` is the only thing that mutates
//!    session state, one intent or wakeup at a time.
//!
//! 2. **Injected Collaborators**: randomness (`RandomSource`), timers
//!    (`Scheduler`) and rendering (`RenderSink`) are passed in, never
//!    reached for globally. Tests swap in a seeded RNG, a `VirtualClock`
//!    and an `EventLog`.
//!
//! 3. **Forgiving Intents**: stale or duplicate input is a no-op, never an
//!    error. Only configuration can fail.
//!
//! ## Modules
//!
//! - `core`: cards, configuration, errors, RNG
//! - `grid`: Fisher–Yates pair generation and the card grid
//! - `session`: state machine, events, scheduler seam, snapshots
//! - `runtime`: tokio task hosting a session in real time

pub mod core;
pub mod grid;
pub mod runtime;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    Card, CardIdentity, CardRef, CardState, GameError, GameRng, GameRngState, RandomSource, Result,
    SessionConfig, Theme,
};

pub use crate::grid::{Grid, GridGenerator};

pub use crate::session::{
    CardFace, EventLog, IgnoreReason, NullSink, Outcome, RenderSink, RevealOutcome, Scheduler,
    SessionController, SessionEvent, SessionId, SessionInfo, SessionSnapshot, SessionState,
    SessionStats, TracingSink, VirtualClock, Wakeup,
};

pub use crate::runtime::{spawn_session, Intent, SessionHandle};
