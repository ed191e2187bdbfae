//! Render-side observer interface.
//!
//! The controller reports every visible change as a `SessionEvent` and
//! hands it to a `RenderSink`. Sinks either override `on_event` to see
//! the raw stream, or override the per-event methods they care about
//! and let the default `on_event` dispatch.
//!
//! ## Event Order
//!
//! - `start()`: `SessionStarted`, then `TimeUpdated(time_limit)`
//! - accepted reveal: `CardShown`
//! - pair found: `CardMatched` twice, possibly followed by `GameEnded(Won)`
//! - mismatch settled: `CardHidden` twice
//! - tick: `TimeUpdated`, or `GameEnded(Lost)` once time is exhausted

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::state::{Outcome, SessionId};
use crate::core::{CardIdentity, CardRef, Theme};

/// Grid and display details announced when a session starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session: SessionId,
    pub columns: u32,
    pub rows: u32,
    pub total_pairs: usize,
    pub time_limit_secs: u32,
    /// Passed through from the configuration untouched.
    pub theme: Theme,
}

/// Observable change in a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    SessionStarted(SessionInfo),
    CardShown { card: CardRef, identity: CardIdentity },
    CardHidden { card: CardRef },
    CardMatched { card: CardRef, identity: CardIdentity },
    TimeUpdated { remaining_secs: u32 },
    GameEnded { outcome: Outcome },
}

/// Consumer of session events.
pub trait RenderSink {
    /// Receive one event. The default dispatches to the methods below.
    fn on_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::SessionStarted(info) => self.session_started(info),
            SessionEvent::CardShown { card, identity } => self.card_shown(*card, *identity),
            SessionEvent::CardHidden { card } => self.card_hidden(*card),
            SessionEvent::CardMatched { card, identity } => self.card_matched(*card, *identity),
            SessionEvent::TimeUpdated { remaining_secs } => self.time_updated(*remaining_secs),
            SessionEvent::GameEnded { outcome } => self.game_ended(*outcome),
        }
    }

    fn session_started(&mut self, _info: &SessionInfo) {}

    fn card_shown(&mut self, _card: CardRef, _identity: CardIdentity) {}

    fn card_hidden(&mut self, _card: CardRef) {}

    fn card_matched(&mut self, _card: CardRef, _identity: CardIdentity) {}

    fn time_updated(&mut self, _remaining_secs: u32) {}

    fn game_ended(&mut self, _outcome: Outcome) {}
}

impl<S: RenderSink + ?Sized> RenderSink for &mut S {
    fn on_event(&mut self, event: &SessionEvent) {
        (**self).on_event(event);
    }
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn on_event(&mut self, event: &SessionEvent) {
        (**self).on_event(event);
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn on_event(&mut self, _event: &SessionEvent) {}
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F: FnMut(&SessionEvent)> RenderSink for FnSink<F> {
    fn on_event(&mut self, event: &SessionEvent) {
        (self.0)(event);
    }
}

/// Logs every event through `tracing` at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl RenderSink for TracingSink {
    fn on_event(&mut self, event: &SessionEvent) {
        debug!(?event, "session event");
    }
}

/// Records events in order.
///
/// Clones share the same buffer, so a host can keep one clone while the
/// controller (or the runtime task) owns another.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn last(&self) -> Option<SessionEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    /// Remaining-time values reported so far.
    #[must_use]
    pub fn time_updates(&self) -> Vec<u32> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|e| match e {
                SessionEvent::TimeUpdated { remaining_secs } => Some(*remaining_secs),
                _ => None,
            })
            .collect()
    }
}

impl RenderSink for EventLog {
    fn on_event(&mut self, event: &SessionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
