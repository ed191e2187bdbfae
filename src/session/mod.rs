//! Session state machine, observer interface and timer seam.
//!
//! - `controller`: `SessionController`, the single writer of session state
//! - `events`: `SessionEvent` and the `RenderSink` observer trait
//! - `scheduler`: `Scheduler` trait, `Wakeup` and the `VirtualClock`
//! - `state`: lifecycle enums, stats and snapshots

pub mod controller;
pub mod events;
pub mod scheduler;
pub mod state;

pub use controller::{IgnoreReason, RevealOutcome, SessionController};
pub use events::{EventLog, FnSink, NullSink, RenderSink, SessionEvent, SessionInfo, TracingSink};
pub use scheduler::{Scheduler, VirtualClock, Wakeup};
pub use state::{CardFace, Outcome, SessionId, SessionSnapshot, SessionState, SessionStats};
