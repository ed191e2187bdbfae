//! Real-time session host.
//!
//! `spawn_session` moves a `SessionController` into a tokio task. User
//! intents from any number of `SessionHandle` clones and wakeups from the
//! timer tasks share one unbounded channel, so the controller sees them
//! strictly in arrival order, one at a time.
//!
//! Timer tasks only hold weak senders. Once every handle is dropped the
//! channel closes and the task exits, returning the sink.
//!
//! Must be called from within a tokio runtime.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::core::{CardRef, GameError, RandomSource, Result, SessionConfig};
use crate::session::{
    Outcome, RenderSink, RevealOutcome, Scheduler, SessionController, SessionId, SessionSnapshot,
    Wakeup,
};

/// User intent delivered to a running session task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Start,
    Reveal(CardRef),
    Pause,
    Resume,
    End(Outcome),
}

enum Envelope {
    Intent(Intent),
    Wakeup(Wakeup),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Scheduler backed by tokio timers.
///
/// The ticker is one task driving an interval, aborted on disarm.
/// Settles are detached sleeps.
pub struct TokioScheduler {
    tx: mpsc::WeakUnboundedSender<Envelope>,
    ticker: Option<JoinHandle<()>>,
}

impl TokioScheduler {
    fn new(tx: mpsc::WeakUnboundedSender<Envelope>) -> Self {
        Self { tx, ticker: None }
    }
}

impl Scheduler for TokioScheduler {
    fn arm_ticker(&mut self, session: SessionId, epoch: u64, every: Duration) {
        self.disarm_ticker();
        let tx = self.tx.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(tx) = tx.upgrade() else {
                    break;
                };
                if tx.send(Envelope::Wakeup(Wakeup::Tick { session, epoch })).is_err() {
                    break;
                }
            }
        }));
    }

    fn disarm_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn schedule_settle(&mut self, session: SessionId, turn: u64, after: Duration) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            time::sleep(after).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Envelope::Wakeup(Wakeup::Settle { session, turn }));
            }
        });
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.disarm_ticker();
    }
}

/// Cloneable handle to a session task.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl SessionHandle {
    fn send(&self, envelope: Envelope) -> Result<()> {
        self.tx.send(envelope).map_err(|_| GameError::SessionClosed)
    }

    pub fn send_intent(&self, intent: Intent) -> Result<()> {
        self.send(Envelope::Intent(intent))
    }

    pub fn start(&self) -> Result<()> {
        self.send_intent(Intent::Start)
    }

    pub fn reveal(&self, card: CardRef) -> Result<()> {
        self.send_intent(Intent::Reveal(card))
    }

    pub fn pause(&self) -> Result<()> {
        self.send_intent(Intent::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send_intent(Intent::Resume)
    }

    pub fn end_game(&self, outcome: Outcome) -> Result<()> {
        self.send_intent(Intent::End(outcome))
    }

    /// Snapshot taken after every message sent before this call.
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Envelope::Snapshot(reply))?;
        rx.await.map_err(|_| GameError::SessionClosed)
    }

    /// Ask the task to stop after draining messages sent before this call.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Envelope::Shutdown)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Validate `config` and spawn a session task.
///
/// The session is idle until `start` is sent. The join handle yields the
/// sink back once the task stops.
pub fn spawn_session<R, S>(
    config: SessionConfig,
    rng: R,
    sink: S,
) -> Result<(SessionHandle, JoinHandle<S>)>
where
    R: RandomSource + Send + 'static,
    S: RenderSink + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let scheduler = TokioScheduler::new(tx.downgrade());
    let controller = SessionController::new(config, rng, sink, scheduler)?;
    let task = tokio::spawn(run(controller, rx));
    Ok((SessionHandle { tx }, task))
}

async fn run<S: RenderSink>(
    mut controller: SessionController<S, TokioScheduler>,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
) -> S {
    while let Some(envelope) = rx.recv().await {
        match envelope {
            Envelope::Intent(intent) => apply(&mut controller, intent),
            Envelope::Wakeup(wakeup) => controller.fire(wakeup),
            Envelope::Snapshot(reply) => {
                let _ = reply.send(controller.snapshot());
            }
            Envelope::Shutdown => {
                debug!("session task shutting down");
                break;
            }
        }
    }
    controller.into_sink()
}

fn apply<S: RenderSink>(controller: &mut SessionController<S, TokioScheduler>, intent: Intent) {
    match intent {
        Intent::Start => {
            if let Err(err) = controller.start() {
                warn!(%err, "failed to start session");
            }
        }
        Intent::Reveal(card) => {
            if let RevealOutcome::Ignored(reason) = controller.reveal(card) {
                debug!(%card, ?reason, "reveal ignored");
            }
        }
        Intent::Pause => {
            controller.pause();
        }
        Intent::Resume => {
            controller.resume();
        }
        Intent::End(outcome) => {
            controller.end_game(outcome);
        }
    }
}
