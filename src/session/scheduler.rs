//! Timer seam between the controller and its host.
//!
//! The controller never sleeps. It asks a `Scheduler` to arm the
//! periodic countdown tick and to deliver a one-shot settle after a
//! mismatch, and the host feeds the resulting `Wakeup`s back through
//! `SessionController::fire`, serialized with user intents.
//!
//! Wakeups are tagged with the session (and ticker epoch or turn) that
//! requested them, so a wakeup that outlives its session is ignored
//! instead of touching a newer game.
//!
//! `VirtualClock` is the deterministic implementation: time only moves
//! when the host advances it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::state::SessionId;

/// A timer firing, addressed to the session that scheduled it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wakeup {
    /// Periodic countdown tick from ticker `epoch`.
    Tick { session: SessionId, epoch: u64 },
    /// Mismatch settle for `turn`.
    Settle { session: SessionId, turn: u64 },
}

impl Wakeup {
    #[must_use]
    pub fn session(&self) -> SessionId {
        match self {
            Wakeup::Tick { session, .. } | Wakeup::Settle { session, .. } => *session,
        }
    }
}

/// Timer backend used by the controller.
///
/// At most one ticker is armed at a time; arming replaces the previous
/// one. Settles are independent one-shots and are never cancelled by the
/// controller, only ignored when stale.
pub trait Scheduler {
    /// Arm the countdown ticker, replacing any armed one.
    fn arm_ticker(&mut self, session: SessionId, epoch: u64, every: Duration);

    /// Stop the countdown ticker. No-op when none is armed.
    fn disarm_ticker(&mut self);

    /// Deliver `Wakeup::Settle` once `after` has elapsed.
    fn schedule_settle(&mut self, session: SessionId, turn: u64, after: Duration);
}

impl<K: Scheduler + ?Sized> Scheduler for &mut K {
    fn arm_ticker(&mut self, session: SessionId, epoch: u64, every: Duration) {
        (**self).arm_ticker(session, epoch, every);
    }

    fn disarm_ticker(&mut self) {
        (**self).disarm_ticker();
    }

    fn schedule_settle(&mut self, session: SessionId, turn: u64, after: Duration) {
        (**self).schedule_settle(session, turn, after);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ArmedTicker {
    session: SessionId,
    epoch: u64,
    every: Duration,
    next_due: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingSettle {
    due: Duration,
    seq: u64,
    session: SessionId,
    turn: u64,
}

/// Manually advanced scheduler.
///
/// Ticks recur every `every` starting one interval after arming, the way
/// a wall-clock interval timer behaves. Disarming and re-arming restarts
/// the interval, so partial progress toward the next tick is dropped.
#[derive(Clone, Debug, Default)]
pub struct VirtualClock {
    now: Duration,
    ticker: Option<ArmedTicker>,
    settles: Vec<PendingSettle>,
    next_seq: u64,
}

impl VirtualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since creation.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    #[must_use]
    pub fn ticker_armed(&self) -> bool {
        self.ticker.is_some()
    }

    /// When the armed ticker fires next.
    #[must_use]
    pub fn next_tick_at(&self) -> Option<Duration> {
        self.ticker.map(|t| t.next_due)
    }

    /// Settles scheduled and not yet delivered.
    #[must_use]
    pub fn pending_settles(&self) -> usize {
        self.settles.len()
    }

    /// Pop the earliest wakeup due at or before `until`, moving `now` to
    /// its due time. Settles win ties with the ticker, then scheduling
    /// order decides.
    pub fn pop_due(&mut self, until: Duration) -> Option<Wakeup> {
        let settle = self
            .settles
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= until)
            .min_by_key(|(_, s)| (s.due, s.seq))
            .map(|(i, s)| (i, s.due));
        let tick_due = self.ticker.map(|t| t.next_due).filter(|due| *due <= until);

        match (settle, tick_due) {
            (Some((i, due)), tick) if tick.map_or(true, |t| due <= t) => {
                let s = self.settles.remove(i);
                self.now = self.now.max(due);
                Some(Wakeup::Settle {
                    session: s.session,
                    turn: s.turn,
                })
            }
            (_, Some(due)) => {
                let ticker = self.ticker.as_mut()?;
                ticker.next_due = due + ticker.every;
                self.now = self.now.max(due);
                Some(Wakeup::Tick {
                    session: ticker.session,
                    epoch: ticker.epoch,
                })
            }
            _ => None,
        }
    }

    /// Move virtual time forward to `until` without delivering anything.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

impl Scheduler for VirtualClock {
    fn arm_ticker(&mut self, session: SessionId, epoch: u64, every: Duration) {
        self.ticker = Some(ArmedTicker {
            session,
            epoch,
            every,
            next_due: self.now + every,
        });
    }

    fn disarm_ticker(&mut self) {
        self.ticker = None;
    }

    fn schedule_settle(&mut self, session: SessionId, turn: u64, after: Duration) {
        self.next_seq += 1;
        self.settles.push(PendingSettle {
            due: self.now + after,
            seq: self.next_seq,
            session,
            turn,
        });
    }
}
