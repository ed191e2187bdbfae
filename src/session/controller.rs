//! The session state machine.
//!
//! `SessionController` owns the grid, the countdown and the turn buffer
//! of the current session. Every entry point runs to completion and
//! mutates state through `&mut self`, so intents and timer wakeups are
//! serialized by construction. Hosts that receive them concurrently
//! funnel them through one queue (see `runtime`).
//!
//! ## Lifecycle
//!
//! ```text
//! NotStarted --start--> Running <--pause/resume--> Paused
//!                          |                          |
//!                          +--> Ended(Won | Lost) <---+ (end_game)
//! ```
//!
//! `start()` is accepted in every state and always builds a brand-new
//! session. The previous ticker is disarmed and its pending settle is
//! voided before anything new is armed.
//!
//! ## Example
//!
//! ```
//! use pairs_engine::core::{GameRng, SessionConfig};
//! use pairs_engine::session::{EventLog, SessionController, SessionState, VirtualClock};
//! use std::time::Duration;
//!
//! let config = SessionConfig::new(2, 2).with_time_limit(3);
//! let mut game = SessionController::new(
//!     config,
//!     GameRng::new(7),
//!     EventLog::new(),
//!     VirtualClock::new(),
//! )
//! .unwrap();
//!
//! game.start().unwrap();
//! game.advance(Duration::from_secs(2));
//! assert_eq!(game.remaining_secs(), 1);
//! assert_eq!(game.state(), SessionState::Running);
//! ```

use std::time::Duration;

use smallvec::SmallVec;
use tracing::{debug, info, trace};

use super::events::{RenderSink, SessionEvent, SessionInfo};
use super::scheduler::{Scheduler, VirtualClock, Wakeup};
use super::state::{faces_of, Outcome, SessionId, SessionSnapshot, SessionState, SessionStats};
use crate::core::{CardIdentity, CardRef, CardState, RandomSource, Result, SessionConfig};
use crate::grid::Grid;

/// Why a reveal was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No running session (not started, paused or ended).
    NotRunning,
    /// Two cards are already face up awaiting resolution.
    TurnFull,
    /// The reference is outside the grid.
    OffGrid,
    AlreadyRevealed,
    AlreadyMatched,
}

/// Result of a `reveal` call. Rejections are not errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    Ignored(IgnoreReason),
    /// First card of a turn is face up.
    Revealed,
    /// The turn found a pair.
    Matched(CardIdentity),
    /// The turn missed; both cards turn back after the settle delay.
    Mismatched,
    /// The turn found the last pair.
    Won,
}

impl RevealOutcome {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        !matches!(self, RevealOutcome::Ignored(_))
    }
}

/// Data of one session. Replaced wholesale by `start()`.
#[derive(Debug)]
struct Session {
    id: SessionId,
    grid: Grid,
    state: SessionState,
    turn: SmallVec<[CardRef; 2]>,
    /// Number of the last turn that ended in a mismatch.
    turns_missed: u64,
    /// Mismatched turn waiting for its settle wakeup.
    pending_settle: Option<u64>,
    /// Epoch of the armed ticker, `None` while disarmed.
    ticker_epoch: Option<u64>,
    match_count: usize,
    remaining_secs: u32,
    stats: SessionStats,
}

/// Timed pairs game session.
pub struct SessionController<S, K = VirtualClock> {
    config: SessionConfig,
    rng: Box<dyn RandomSource + Send>,
    sink: S,
    scheduler: K,
    session: Option<Session>,
    sessions_started: u64,
    tickers_armed: u64,
}

impl<S: RenderSink, K: Scheduler> SessionController<S, K> {
    /// Create a controller. Fails fast on an invalid configuration, before
    /// any grid exists.
    pub fn new<R>(config: SessionConfig, rng: R, sink: S, scheduler: K) -> Result<Self>
    where
        R: RandomSource + Send + 'static,
    {
        config.validate()?;
        Ok(Self {
            config,
            rng: Box::new(rng),
            sink,
            scheduler,
            session: None,
            sessions_started: 0,
            tickers_armed: 0,
        })
    }

    // =========================================================================
    // Intents
    // =========================================================================

    /// Start a fresh session with a newly shuffled grid.
    ///
    /// Accepted in any state. Whatever was in progress is discarded.
    pub fn start(&mut self) -> Result<SessionId> {
        let grid = Grid::generate(&self.config, self.rng.as_mut())?;
        Ok(self.install(grid))
    }

    /// Start a fresh session on a known layout.
    ///
    /// Every card is turned face down first. The layout's shape replaces
    /// the configured one for this session only. A layout that breaks the
    /// grid invariants is rejected and the current session is left alone.
    pub fn start_with_layout(&mut self, mut grid: Grid) -> Result<SessionId> {
        grid.validate()?;
        for i in 0..grid.len() {
            grid.set_state(CardRef::new(i), CardState::Hidden);
        }
        Ok(self.install(grid))
    }

    /// Turn a card face up.
    ///
    /// Ignored unless the session is running, fewer than two cards are
    /// pending and the card is face down.
    pub fn reveal(&mut self, card: CardRef) -> RevealOutcome {
        let Some(session) = self.session.as_mut() else {
            return ignored(card, IgnoreReason::NotRunning);
        };
        if !session.state.is_running() {
            return ignored(card, IgnoreReason::NotRunning);
        }
        if session.turn.len() >= 2 {
            return ignored(card, IgnoreReason::TurnFull);
        }
        let identity = match session.grid.get(card) {
            None => return ignored(card, IgnoreReason::OffGrid),
            Some(c) if c.state == CardState::Revealed => {
                return ignored(card, IgnoreReason::AlreadyRevealed)
            }
            Some(c) if c.state == CardState::Matched => {
                return ignored(card, IgnoreReason::AlreadyMatched)
            }
            Some(c) => c.identity,
        };

        session.grid.set_state(card, CardState::Revealed);
        session.turn.push(card);
        session.stats.reveals += 1;
        debug!(session = %session.id, %card, %identity, "card revealed");
        self.sink.on_event(&SessionEvent::CardShown { card, identity });

        if session.turn.len() < 2 {
            return RevealOutcome::Revealed;
        }

        let (first, second) = (session.turn[0], session.turn[1]);
        let first_identity = session.grid.get(first).map(|c| c.identity);
        if first_identity == Some(identity) {
            for c in [first, second] {
                session.grid.set_state(c, CardState::Matched);
                self.sink.on_event(&SessionEvent::CardMatched { card: c, identity });
            }
            session.turn.clear();
            session.match_count += 1;
            session.stats.matches += 1;
            debug!(
                session = %session.id,
                %identity,
                matches = session.match_count,
                total = session.grid.total_pairs(),
                "pair matched"
            );

            if session.match_count == session.grid.total_pairs() {
                finish(session, Outcome::Won, &mut self.sink, &mut self.scheduler);
                return RevealOutcome::Won;
            }
            RevealOutcome::Matched(identity)
        } else {
            session.turns_missed += 1;
            session.stats.mismatches += 1;
            let turn = session.turns_missed;
            session.pending_settle = Some(turn);
            self.scheduler
                .schedule_settle(session.id, turn, self.config.settle_delay());
            debug!(session = %session.id, %first, %second, turn, "mismatch, settle scheduled");
            RevealOutcome::Mismatched
        }
    }

    /// Freeze the countdown. Only while running.
    ///
    /// A pending mismatch settle is not affected.
    pub fn pause(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.state.is_running() {
            trace!(state = ?session.state, "pause ignored");
            return false;
        }
        if session.ticker_epoch.take().is_some() {
            self.scheduler.disarm_ticker();
        }
        session.state = SessionState::Paused;
        debug!(session = %session.id, remaining = session.remaining_secs, "paused");
        true
    }

    /// Continue the countdown from where it was frozen. Only while paused.
    pub fn resume(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.state != SessionState::Paused {
            trace!(state = ?session.state, "resume ignored");
            return false;
        }
        self.tickers_armed += 1;
        let epoch = self.tickers_armed;
        session.ticker_epoch = Some(epoch);
        self.scheduler
            .arm_ticker(session.id, epoch, self.config.tick_interval());
        session.state = SessionState::Running;
        debug!(session = %session.id, remaining = session.remaining_secs, "resumed");
        true
    }

    /// End the current session with `outcome`.
    ///
    /// Returns false when there is nothing to end or it already ended.
    pub fn end_game(&mut self, outcome: Outcome) -> bool {
        match self.session.as_mut() {
            Some(session) => finish(session, outcome, &mut self.sink, &mut self.scheduler),
            None => false,
        }
    }

    // =========================================================================
    // Time
    // =========================================================================

    /// One countdown step. Only while running: decrement the remaining
    /// time, or lose once it is already zero.
    pub fn tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.state.is_running() {
            trace!(state = ?session.state, "tick ignored");
            return;
        }
        session.stats.ticks += 1;
        if session.remaining_secs > 0 {
            session.remaining_secs -= 1;
            trace!(session = %session.id, remaining = session.remaining_secs, "tick");
            self.sink.on_event(&SessionEvent::TimeUpdated {
                remaining_secs: session.remaining_secs,
            });
        } else {
            finish(session, Outcome::Lost, &mut self.sink, &mut self.scheduler);
        }
    }

    /// Deliver a scheduler wakeup. Wakeups from superseded sessions,
    /// disarmed tickers or already-voided settles are dropped.
    pub fn fire(&mut self, wakeup: Wakeup) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.id != wakeup.session() {
            trace!(current = %session.id, ?wakeup, "stale wakeup dropped");
            return;
        }
        match wakeup {
            Wakeup::Tick { epoch, .. } => {
                if session.ticker_epoch == Some(epoch) {
                    self.tick();
                } else {
                    trace!(?wakeup, "tick from disarmed ticker dropped");
                }
            }
            Wakeup::Settle { turn, .. } => {
                if session.pending_settle != Some(turn) {
                    trace!(?wakeup, "settle no longer pending");
                    return;
                }
                session.pending_settle = None;
                for card in std::mem::take(&mut session.turn) {
                    session.grid.set_state(card, CardState::Hidden);
                    self.sink.on_event(&SessionEvent::CardHidden { card });
                }
                debug!(session = %session.id, turn, "mismatch settled");
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.as_ref().map_or(SessionState::NotStarted, |s| s.state)
    }

    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Seconds left. The configured limit before the first start.
    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.session
            .as_ref()
            .map_or(self.config.time_limit_secs, |s| s.remaining_secs)
    }

    #[must_use]
    pub fn match_count(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.match_count)
    }

    #[must_use]
    pub fn total_pairs(&self) -> usize {
        self.session
            .as_ref()
            .map_or(self.config.total_pairs(), |s| s.grid.total_pairs())
    }

    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        self.session.as_ref().map(|s| &s.grid)
    }

    /// Cards face up in the current, unresolved turn.
    #[must_use]
    pub fn pending_turn(&self) -> &[CardRef] {
        match &self.session {
            Some(s) => s.turn.as_slice(),
            None => &[],
        }
    }

    /// True while a mismatched pair waits to be turned back.
    #[must_use]
    pub fn is_settling(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.pending_settle.is_some())
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.session.as_ref().map(|s| s.stats).unwrap_or_default()
    }

    /// Player-visible view of the whole session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        match &self.session {
            Some(s) => SessionSnapshot {
                session: Some(s.id),
                state: s.state,
                remaining_secs: s.remaining_secs,
                match_count: s.match_count,
                total_pairs: s.grid.total_pairs(),
                columns: s.grid.columns(),
                rows: s.grid.rows(),
                faces: faces_of(&s.grid),
                stats: s.stats,
            },
            None => SessionSnapshot {
                session: None,
                state: SessionState::NotStarted,
                remaining_secs: self.config.time_limit_secs,
                match_count: 0,
                total_pairs: self.config.total_pairs(),
                columns: self.config.columns,
                rows: self.config.rows,
                faces: Vec::new(),
                stats: SessionStats::default(),
            },
        }
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    #[must_use]
    pub fn scheduler(&self) -> &K {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut K {
        &mut self.scheduler
    }

    /// Consume the controller and hand back the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn install(&mut self, grid: Grid) -> SessionId {
        if let Some(old) = self.session.as_mut() {
            if old.ticker_epoch.take().is_some() {
                self.scheduler.disarm_ticker();
            }
            old.pending_settle = None;
        }

        self.sessions_started += 1;
        self.tickers_armed += 1;
        let id = SessionId(self.sessions_started);
        let epoch = self.tickers_armed;
        let time_limit = self.config.time_limit_secs;

        let info = SessionInfo {
            session: id,
            columns: grid.columns(),
            rows: grid.rows(),
            total_pairs: grid.total_pairs(),
            time_limit_secs: time_limit,
            theme: self.config.theme.clone(),
        };

        self.session = Some(Session {
            id,
            grid,
            state: SessionState::Running,
            turn: SmallVec::new(),
            turns_missed: 0,
            pending_settle: None,
            ticker_epoch: Some(epoch),
            match_count: 0,
            remaining_secs: time_limit,
            stats: SessionStats::default(),
        });
        self.scheduler.arm_ticker(id, epoch, self.config.tick_interval());

        info!(
            session = %id,
            columns = info.columns,
            rows = info.rows,
            time_limit,
            "session started"
        );
        self.sink.on_event(&SessionEvent::SessionStarted(info));
        self.sink.on_event(&SessionEvent::TimeUpdated {
            remaining_secs: time_limit,
        });
        id
    }
}

impl<S: RenderSink> SessionController<S, VirtualClock> {
    /// Move virtual time forward by `by`, delivering every wakeup that
    /// falls due in order, including ones scheduled along the way.
    pub fn advance(&mut self, by: Duration) {
        let until = self.scheduler.now() + by;
        while let Some(wakeup) = self.scheduler.pop_due(until) {
            self.fire(wakeup);
        }
        self.scheduler.advance_to(until);
    }
}

fn ignored(card: CardRef, reason: IgnoreReason) -> RevealOutcome {
    trace!(%card, ?reason, "reveal ignored");
    RevealOutcome::Ignored(reason)
}

/// Transition to `Ended(outcome)`. No effect if already ended.
fn finish<S, K>(session: &mut Session, outcome: Outcome, sink: &mut S, scheduler: &mut K) -> bool
where
    S: RenderSink,
    K: Scheduler,
{
    if session.state.is_ended() {
        return false;
    }
    if session.ticker_epoch.take().is_some() {
        scheduler.disarm_ticker();
    }
    session.pending_settle = None;
    session.state = SessionState::Ended(outcome);
    info!(
        session = %session.id,
        ?outcome,
        matches = session.match_count,
        remaining = session.remaining_secs,
        "session ended"
    );
    sink.on_event(&SessionEvent::GameEnded { outcome });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, GameRng};
    use crate::session::EventLog;

    fn layout(columns: u32, rows: u32, ids: &[u32]) -> Grid {
        let cards = ids.iter().map(|&id| Card::new(CardIdentity::new(id))).collect();
        Grid::from_cards(columns, rows, cards).unwrap()
    }

    fn controller(config: SessionConfig) -> SessionController<EventLog> {
        SessionController::new(config, GameRng::new(1), EventLog::new(), VirtualClock::new()).unwrap()
    }

    #[test]
    fn test_new_rejects_odd_grid() {
        let result = SessionController::new(
            SessionConfig::new(3, 3),
            GameRng::new(1),
            EventLog::new(),
            VirtualClock::new(),
        );
        assert!(result.err().unwrap().is_invalid_configuration());
    }

    #[test]
    fn test_not_started_queries() {
        let c = controller(SessionConfig::new(2, 2).with_time_limit(9));
        assert_eq!(c.state(), SessionState::NotStarted);
        assert_eq!(c.remaining_secs(), 9);
        assert_eq!(c.total_pairs(), 2);
        assert!(c.grid().is_none());
        assert!(c.pending_turn().is_empty());
        assert_eq!(c.snapshot().faces.len(), 0);
    }

    #[test]
    fn test_intents_before_start_are_ignored() {
        let mut c = controller(SessionConfig::new(2, 2));
        assert_eq!(c.reveal(CardRef(0)), RevealOutcome::Ignored(IgnoreReason::NotRunning));
        assert!(!c.pause());
        assert!(!c.resume());
        assert!(!c.end_game(Outcome::Won));
        c.tick();
        assert!(c.sink().is_empty());
    }

    #[test]
    fn test_start_emits_info_and_time() {
        let mut c = controller(SessionConfig::new(2, 3).with_time_limit(20));
        let id = c.start().unwrap();

        let events = c.sink().events();
        assert_eq!(events.len(), 2);
        match &events[0] {
            SessionEvent::SessionStarted(info) => {
                assert_eq!(info.session, id);
                assert_eq!(info.total_pairs, 3);
                assert_eq!(info.theme.font, "Helvetica, sans-serif");
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(events[1], SessionEvent::TimeUpdated { remaining_secs: 20 });
        assert!(c.scheduler().ticker_armed());
    }

    #[test]
    fn test_off_grid_reveal() {
        let mut c = controller(SessionConfig::new(2, 2));
        c.start().unwrap();
        assert_eq!(c.reveal(CardRef(4)), RevealOutcome::Ignored(IgnoreReason::OffGrid));
    }

    #[test]
    fn test_match_then_win() {
        let mut c = controller(SessionConfig::new(2, 2));
        c.start_with_layout(layout(2, 2, &[1, 2, 1, 2])).unwrap();

        assert_eq!(c.reveal(CardRef(0)), RevealOutcome::Revealed);
        assert_eq!(c.reveal(CardRef(2)), RevealOutcome::Matched(CardIdentity(1)));
        assert_eq!(c.match_count(), 1);
        assert!(c.pending_turn().is_empty());

        assert_eq!(c.reveal(CardRef(0)), RevealOutcome::Ignored(IgnoreReason::AlreadyMatched));
        assert_eq!(c.reveal(CardRef(1)), RevealOutcome::Revealed);
        assert_eq!(c.reveal(CardRef(3)), RevealOutcome::Won);
        assert_eq!(c.state(), SessionState::Ended(Outcome::Won));
        assert!(!c.scheduler().ticker_armed());
        assert_eq!(c.stats().precision_pct(), 100);
    }

    #[test]
    fn test_same_card_twice_is_ignored() {
        let mut c = controller(SessionConfig::new(2, 2));
        c.start_with_layout(layout(2, 2, &[1, 2, 1, 2])).unwrap();
        c.reveal(CardRef(0));
        assert_eq!(c.reveal(CardRef(0)), RevealOutcome::Ignored(IgnoreReason::AlreadyRevealed));
        assert_eq!(c.pending_turn(), &[CardRef(0)]);
    }

    #[test]
    fn test_settle_while_paused_still_hides() {
        let mut c = controller(SessionConfig::new(2, 2));
        c.start_with_layout(layout(2, 2, &[1, 2, 1, 2])).unwrap();
        c.reveal(CardRef(0));
        assert_eq!(c.reveal(CardRef(1)), RevealOutcome::Mismatched);

        assert!(c.pause());
        c.advance(Duration::from_secs(1));

        assert_eq!(c.state(), SessionState::Paused);
        assert!(c.pending_turn().is_empty());
        assert_eq!(c.grid().unwrap().count_in(CardState::Hidden), 4);
        assert_eq!(c.remaining_secs(), 60);
    }

    #[test]
    fn test_end_game_voids_pending_settle() {
        let mut c = controller(SessionConfig::new(2, 2));
        c.start_with_layout(layout(2, 2, &[1, 2, 1, 2])).unwrap();
        c.reveal(CardRef(0));
        c.reveal(CardRef(1));
        assert!(c.is_settling());

        assert!(c.end_game(Outcome::Lost));
        let before = c.sink().len();
        c.advance(Duration::from_secs(5));

        assert_eq!(c.sink().len(), before);
        assert_eq!(c.grid().unwrap().count_in(CardState::Revealed), 2);
    }

    #[test]
    fn test_stale_tick_epoch_dropped() {
        let mut c = controller(SessionConfig::new(2, 2).with_time_limit(10));
        let id = c.start().unwrap();
        c.pause();
        c.resume();

        // Epoch 1 belonged to the ticker armed by start().
        c.fire(Wakeup::Tick { session: id, epoch: 1 });
        assert_eq!(c.remaining_secs(), 10);

        c.fire(Wakeup::Tick { session: id, epoch: 2 });
        assert_eq!(c.remaining_secs(), 9);
    }

    #[test]
    fn test_snapshot_hides_face_down_identities() {
        let mut c = controller(SessionConfig::new(2, 2));
        c.start_with_layout(layout(2, 2, &[1, 2, 1, 2])).unwrap();
        c.reveal(CardRef(1));

        let snap = c.snapshot();
        assert_eq!(snap.faces[0], crate::session::CardFace::Hidden);
        assert_eq!(snap.faces[1], crate::session::CardFace::Revealed(CardIdentity(2)));
        assert_eq!(snap.stats.reveals, 1);
    }
}
