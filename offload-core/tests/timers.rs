//! The tokio timer runtime against a live controller.

use offload_core::controller::{Effect, Event, PhaseKind, TimerId, TimerKind};
use offload_core::{ExperimentConfig, ExperimentSession, ManualClock, TimerSet};
use std::time::Duration;

fn schedule(id: u64, ms: u64) -> Effect {
    Effect::ScheduleTimer {
        id: TimerId(id),
        kind: TimerKind::Countdown,
        after: Duration::from_millis(ms),
    }
}

#[tokio::test(start_paused = true)]
async fn test_scheduled_timer_fires() {
    let (mut timers, mut fired) = TimerSet::new();
    timers.apply(&[schedule(1, 3000)]);
    assert_eq!(timers.len(), 1);

    let id = fired.recv().await.unwrap();
    assert_eq!(id, TimerId(1));
    timers.fired(id);
    assert!(timers.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timers_fire_in_due_order() {
    let (mut timers, mut fired) = TimerSet::new();
    timers.apply(&[schedule(1, 2000), schedule(2, 500), schedule(3, 1000)]);

    let mut order = Vec::new();
    for _ in 0..3 {
        order.push(fired.recv().await.unwrap());
    }
    assert_eq!(order, vec![TimerId(2), TimerId(3), TimerId(1)]);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_timer_never_fires() {
    let (mut timers, mut fired) = TimerSet::new();
    timers.apply(&[schedule(1, 1000), schedule(2, 2000)]);
    timers.apply(&[Effect::CancelTimer(TimerId(1))]);
    assert_eq!(timers.len(), 1);

    assert_eq!(fired.recv().await, Some(TimerId(2)));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(fired.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_clear_aborts_everything() {
    let (mut timers, mut fired) = TimerSet::new();
    timers.apply(&[schedule(1, 100), schedule(2, 200)]);
    timers.clear();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(fired.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_drives_encoding_exposure() {
    let config = ExperimentConfig::new()
        .with_participant_id("P-timers")
        .unwrap()
        .with_seed(21);
    let clock = ManualClock::default();
    let mut session = ExperimentSession::with_clock(config, clock.clone());
    let (mut timers, mut fired) = TimerSet::new();

    let effects = session.handle(Event::Start).unwrap();
    timers.apply(&effects);
    assert!(session.handle(Event::Advance).is_err());

    let id = fired.recv().await.unwrap();
    timers.fired(id);
    clock.advance_ms(3000);
    let effects = session.handle(Event::TimerFired(id)).unwrap();
    timers.apply(&effects);
    assert!(timers.is_empty());

    let effects = session.handle(Event::Advance).unwrap();
    timers.apply(&effects);
    assert_eq!(session.kind(), PhaseKind::Encoding);
    assert_eq!(timers.len(), 1);
    assert_eq!(session.experiment().log().encoding()[0].reading_time, 3000);
}
