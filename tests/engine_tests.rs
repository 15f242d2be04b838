//! Scenario tests for the timer engine's time accounting.
//!
//! Each test drives the engine through a realistic user flow under a
//! simulated clock and asserts the credited minutes and persisted progress
//! at the end of the flow.

use std::sync::Arc;

use tokio::sync::mpsc;

use studytimer::engine::{ManualTimeSource, TimeSource, TimerEngine, TimerEvent};
use studytimer::sink::MemorySink;
use studytimer::types::{TimerConfig, TimerPhase};

// ============================================================================
// Test Helpers
// ============================================================================

const T0: u64 = 1_700_000_000_000;

struct Fixture {
    engine: TimerEngine,
    time: Arc<ManualTimeSource>,
    rx: mpsc::UnboundedReceiver<TimerEvent>,
    sink: MemorySink,
}

fn fixture() -> Fixture {
    let (tx, rx) = mpsc::unbounded_channel();
    let time = ManualTimeSource::starting_at(T0);
    let sink = MemorySink::new();
    let engine = TimerEngine::with_time_source(
        TimerConfig::default(),
        Box::new(sink.clone()),
        tx,
        Arc::clone(&time) as Arc<dyn TimeSource>,
    );
    Fixture {
        engine,
        time,
        rx,
        sink,
    }
}

impl Fixture {
    /// Advances simulated time in 250ms steps, ticking the engine at each,
    /// the way the daemon's tick task would.
    fn run_for_secs(&mut self, secs: u64) {
        for _ in 0..secs * 4 {
            self.time.advance_ms(250);
            self.engine.tick();
        }
    }

    fn drain(&mut self) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn total_minutes(&self) -> u64 {
        self.sink.state().lock().unwrap().total_minutes()
    }
}

// ============================================================================
// Session Flows
// ============================================================================

#[test]
fn full_session_credits_planned_minutes() {
    let mut f = fixture();

    f.engine.start(Some(2));
    f.run_for_secs(120);

    assert_eq!(f.engine.phase(), TimerPhase::Finished);
    assert_eq!(f.total_minutes(), 2);
    assert_eq!(f.engine.snapshot().sessions_finished, 1);
}

#[test]
fn pause_resume_credits_running_time_only() {
    let mut f = fixture();

    // 10-minute session: run 2 minutes, pause 5, run 1, finish.
    f.engine.start(Some(10));
    f.run_for_secs(120);
    f.engine.pause();
    f.time.advance_secs(300);
    f.engine.resume();
    f.run_for_secs(60);

    let credited = f.engine.finish_manual().unwrap();
    assert_eq!(credited, 3);
    assert_eq!(f.total_minutes(), 3);
}

#[test]
fn paused_deadline_does_not_fire() {
    let mut f = fixture();

    f.engine.start(Some(1));
    f.run_for_secs(30);
    f.engine.pause();

    // The planned deadline passes while paused; nothing finishes.
    f.time.advance_secs(600);
    f.engine.tick();
    assert_eq!(f.engine.phase(), TimerPhase::Paused);
    assert_eq!(f.total_minutes(), 0);

    // Resuming grants the full snapshotted remainder.
    f.engine.resume();
    f.run_for_secs(30);
    assert_eq!(f.engine.phase(), TimerPhase::Finished);
    assert_eq!(f.total_minutes(), 1);
}

#[test]
fn reset_never_credits() {
    let mut f = fixture();

    f.engine.start(Some(25));
    f.run_for_secs(24 * 60);
    f.engine.reset();

    assert_eq!(f.engine.phase(), TimerPhase::Idle);
    assert_eq!(f.total_minutes(), 0);
    assert_eq!(f.engine.snapshot().sessions_finished, 0);
}

#[test]
fn reset_flushes_progress_before_teardown() {
    let mut f = fixture();

    f.engine.start(Some(25));
    f.run_for_secs(95);
    f.engine.reset();

    let state = f.sink.state();
    let state = state.lock().unwrap();
    let saved: Vec<u64> = state.progress.values().copied().collect();
    assert_eq!(saved, vec![95]);
    assert!(state.credits.is_empty());
}

#[test]
fn back_to_back_sessions_accumulate() {
    let mut f = fixture();

    f.engine.start(Some(1));
    f.run_for_secs(60);
    assert_eq!(f.engine.phase(), TimerPhase::Finished);

    f.engine.start(Some(2));
    f.run_for_secs(120);
    assert_eq!(f.engine.phase(), TimerPhase::Finished);

    assert_eq!(f.total_minutes(), 3);
    assert_eq!(f.engine.snapshot().sessions_finished, 2);
}

// ============================================================================
// Deadline Behavior Under a Throttled Host
// ============================================================================

#[test]
fn single_late_tick_finishes_with_correct_credit() {
    let mut f = fixture();

    // The host sleeps through the whole countdown; one tick fires long
    // after the deadline.
    f.engine.start(Some(5));
    f.time.advance_secs(20 * 60);
    f.engine.tick();

    assert_eq!(f.engine.phase(), TimerPhase::Finished);
    // Automatic completion uses the same elapsed formula as a manual
    // finish: unpaused wall time since the session anchor.
    assert_eq!(f.total_minutes(), 20);
}

#[test]
fn skipped_ticks_do_not_slow_the_countdown() {
    let mut f = fixture();

    f.engine.start(Some(10));
    f.drain();

    // Only one tick in 3 minutes.
    f.time.advance_secs(180);
    f.engine.tick();

    let events = f.drain();
    assert!(events.contains(&TimerEvent::Tick {
        remaining_ms: 420_000
    }));
}

#[test]
fn finish_after_deadline_credits_once() {
    let mut f = fixture();

    f.engine.start(Some(1));
    f.run_for_secs(61);

    assert_eq!(f.engine.phase(), TimerPhase::Finished);
    // A manual finish arriving after the automatic one is a no-op.
    assert!(f.engine.finish_manual().is_none());
    assert_eq!(f.total_minutes(), 1);
}

// ============================================================================
// Rounding
// ============================================================================

#[test]
fn rounding_is_to_the_nearest_minute() {
    for (run_secs, expected) in [(29, 0), (31, 1), (89, 1), (91, 2)] {
        let mut f = fixture();
        f.engine.start(Some(25));
        f.run_for_secs(run_secs);
        assert_eq!(
            f.engine.finish_manual().unwrap(),
            expected,
            "{}s should credit {} min",
            run_secs,
            expected
        );
    }
}

#[test]
fn seconds_only_session_credits_nothing() {
    let mut f = fixture();

    f.engine.start(Some(25));
    f.run_for_secs(10);
    assert_eq!(f.engine.finish_manual(), Some(0));

    let state = f.sink.state();
    assert!(state.lock().unwrap().credits.is_empty());
}

// ============================================================================
// Progress Saves
// ============================================================================

#[test]
fn progress_saved_every_interval() {
    let mut f = fixture();

    f.engine.start(Some(25));
    f.run_for_secs(95);

    // Saves at 30, 60 and 90 elapsed seconds; the recorded value is the
    // latest (sink keeps the maximum).
    let state = f.sink.state();
    let state = state.lock().unwrap();
    let saved: Vec<u64> = state.progress.values().copied().collect();
    assert_eq!(saved, vec![90]);
}

#[test]
fn progress_save_failure_does_not_stop_the_timer() {
    let mut f = fixture();

    f.engine.start(Some(2));
    f.run_for_secs(29);
    f.sink.fail_next();
    f.run_for_secs(91);

    // The failed save was reported, the countdown still finished and the
    // credit landed.
    assert_eq!(f.engine.phase(), TimerPhase::Finished);
    assert_eq!(f.total_minutes(), 2);
    assert!(f
        .drain()
        .iter()
        .any(|e| matches!(e, TimerEvent::SaveFailed { .. })));
}

// ============================================================================
// Backgrounding
// ============================================================================

#[test]
fn suspend_pauses_and_preserves_remaining() {
    let mut f = fixture();

    f.engine.start(Some(10));
    f.run_for_secs(240);
    f.engine.suspend();

    // An hour in the background costs nothing.
    f.time.advance_secs(3600);
    assert_eq!(f.engine.phase(), TimerPhase::Paused);
    assert_eq!(f.engine.snapshot().remaining_ms, 360_000);

    f.engine.resume();
    f.run_for_secs(6 * 60);
    assert_eq!(f.engine.phase(), TimerPhase::Finished);
    assert_eq!(f.total_minutes(), 10);
}
