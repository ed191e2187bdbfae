//! Async hosting of a session on tokio.

pub mod driver;

pub use driver::{spawn_session, Intent, SessionHandle, TokioScheduler};
