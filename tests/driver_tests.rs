//! Real-time driver tests.
//!
//! Run on tokio's paused clock, so timers fire as soon as the runtime is
//! otherwise idle and the tests finish instantly.

use std::time::Duration;

use pairs_engine::core::{CardRef, GameRng, SessionConfig};
use pairs_engine::runtime::spawn_session;
use pairs_engine::session::{EventLog, Outcome, SessionEvent, SessionState};
use pairs_engine::{CardFace, GameError};

/// Session task stays idle until started.
#[tokio::test(start_paused = true)]
async fn test_idle_until_started() {
    let (handle, _task) =
        spawn_session(SessionConfig::new(2, 2), GameRng::new(1), EventLog::new()).unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state, SessionState::NotStarted);
    assert_eq!(snap.remaining_secs, 60);
}

/// The countdown runs on real (paused) time and ends the game.
#[tokio::test(start_paused = true)]
async fn test_timeout_in_real_time() {
    let log = EventLog::new();
    let config = SessionConfig::new(2, 2).with_time_limit(2);
    let (handle, _task) = spawn_session(config, GameRng::new(1), log.clone()).unwrap();

    handle.start().unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state, SessionState::Running);
    assert_eq!(snap.remaining_secs, 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state, SessionState::Ended(Outcome::Lost));
    assert_eq!(log.time_updates(), vec![2, 1, 0]);
    assert_eq!(log.last(), Some(SessionEvent::GameEnded { outcome: Outcome::Lost }));
}

/// Pausing stops the clock until resumed.
#[tokio::test(start_paused = true)]
async fn test_pause_and_resume() {
    let config = SessionConfig::new(2, 2).with_time_limit(30);
    let (handle, _task) = spawn_session(config, GameRng::new(1), EventLog::new()).unwrap();

    handle.start().unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    handle.pause().unwrap();
    assert_eq!(handle.snapshot().await.unwrap().remaining_secs, 28);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state, SessionState::Paused);
    assert_eq!(snap.remaining_secs, 28);

    handle.resume().unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(handle.snapshot().await.unwrap().remaining_secs, 27);
}

/// Intents are applied in the order they were sent.
#[tokio::test(start_paused = true)]
async fn test_intents_in_order() {
    let (handle, _task) =
        spawn_session(SessionConfig::new(2, 2), GameRng::new(5), EventLog::new()).unwrap();

    handle.start().unwrap();
    handle.reveal(CardRef(0)).unwrap();
    handle.reveal(CardRef(0)).unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.stats.reveals, 1);
    assert!(snap.faces[0] != CardFace::Hidden);

    handle.end_game(Outcome::Won).unwrap();
    handle.reveal(CardRef(1)).unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state, SessionState::Ended(Outcome::Won));
    assert_eq!(snap.stats.reveals, 1);
}

/// A mismatched pair is turned back after the settle delay.
#[tokio::test(start_paused = true)]
async fn test_mismatch_settles_in_real_time() {
    let config = SessionConfig::new(4, 4);
    let (handle, _task) = spawn_session(config, GameRng::new(11), EventLog::new()).unwrap();
    handle.start().unwrap();

    // Reveal neighbouring cards two at a time until a turn misses.
    for k in 0..8 {
        handle.reveal(CardRef(2 * k)).unwrap();
        handle.reveal(CardRef(2 * k + 1)).unwrap();
        if handle.snapshot().await.unwrap().stats.mismatches == 1 {
            break;
        }
    }
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.stats.mismatches, 1);
    let face_up = |faces: &[CardFace]| {
        faces
            .iter()
            .filter(|f| matches!(f, CardFace::Revealed(_)))
            .count()
    };
    assert_eq!(face_up(&snap.faces), 2);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(face_up(&snap.faces), 0);
    assert_eq!(snap.state, SessionState::Running);
}

/// Shutdown returns the sink with the full event history.
#[tokio::test(start_paused = true)]
async fn test_shutdown_returns_sink() {
    let (handle, task) =
        spawn_session(SessionConfig::new(2, 2), GameRng::new(1), EventLog::new()).unwrap();

    handle.start().unwrap();
    handle.shutdown().unwrap();
    let log = task.await.unwrap();

    assert!(matches!(log.events()[0], SessionEvent::SessionStarted(_)));
    assert!(handle.is_closed());
    assert!(matches!(handle.start(), Err(GameError::SessionClosed)));
    assert!(matches!(handle.snapshot().await, Err(GameError::SessionClosed)));
}

/// Invalid configurations are rejected before any task is spawned.
#[tokio::test]
async fn test_invalid_config_rejected() {
    let result = spawn_session(SessionConfig::new(3, 3), GameRng::new(1), EventLog::new());
    assert!(result.err().unwrap().is_invalid_configuration());
}
