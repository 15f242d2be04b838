//! Timer engine for study sessions.
//!
//! This module provides the core timer functionality:
//! - State transitions (Idle → Running ⇄ Paused → Finished)
//! - Deadline detection from wall-clock deltas on every tick
//! - Event firing for display updates and completion signals
//! - Best-effort persistence through a `PersistenceSink`
//!
//! All operations are no-ops where the current phase disallows them, and
//! sink failures never alter engine state: they are reported as events and
//! retried at the next save opportunity.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::sink::{PersistenceSink, SessionMeta};
use crate::types::{TimerConfig, TimerPhase, TimerSnapshot};

use super::clock::{SessionClock, SystemTimeSource, TimeSource};

// ============================================================================
// TimerEvent
// ============================================================================

/// How a session reached Finished. Affects UI wording only, never the
/// credited-minutes accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The user finished the session explicitly
    Manual,
    /// The countdown reached its deadline
    Automatic,
}

/// Timer events for display updates and external integrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A new session left Idle
    Started {
        /// Planned countdown length in seconds
        planned_seconds: u32,
    },
    /// A paused session is counting down again
    Resumed {
        /// Remaining milliseconds
        remaining_ms: u64,
    },
    /// The countdown was suspended
    Paused {
        /// Remaining milliseconds, snapshotted at the pause
        remaining_ms: u64,
    },
    /// The engine returned to Idle without crediting
    Reset,
    /// Periodic display refresh
    Tick {
        /// Remaining milliseconds
        remaining_ms: u64,
    },
    /// The session finished and minutes were credited
    Finished {
        /// Whole minutes credited (may be zero)
        minutes_credited: u32,
        /// Manual or automatic completion
        completion: Completion,
    },
    /// In-flight progress was saved to the sink
    ProgressSaved {
        /// Accumulated elapsed seconds
        seconds: u64,
    },
    /// A sink write failed; it will be retried on the next save opportunity
    SaveFailed {
        /// Failure description for status display
        message: String,
    },
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine owning all session state and elapsed-time accounting.
pub struct TimerEngine {
    /// Current phase
    phase: TimerPhase,
    /// Timer configuration
    config: TimerConfig,
    /// Wall-clock bookkeeping of the in-flight session
    clock: Option<SessionClock>,
    /// Identity of the in-flight session, for the sink
    session: Option<SessionMeta>,
    /// Duration preview shown while Idle/Finished, in minutes
    preview_minutes: u32,
    /// Elapsed-seconds threshold for the next periodic progress save
    next_progress_secs: u64,
    /// Engine-side total of credited minutes; never rolled back
    minutes_credited: u64,
    /// Finish events that credited time
    sessions_finished: u32,
    /// Lesson this engine accounts time against
    lesson_key: Option<String>,
    /// Time source (system clock in production, manual in tests)
    time: Arc<dyn TimeSource>,
    /// Persistence destination for credits and progress
    sink: Box<dyn PersistenceSink>,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates a new engine with the system clock.
    pub fn new(
        config: TimerConfig,
        sink: Box<dyn PersistenceSink>,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        Self::with_time_source(config, sink, event_tx, Arc::new(SystemTimeSource))
    }

    /// Creates a new engine with an explicit time source.
    pub fn with_time_source(
        config: TimerConfig,
        sink: Box<dyn PersistenceSink>,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let preview_minutes = config.clamp_minutes(None);
        Self {
            phase: TimerPhase::Idle,
            config,
            clock: None,
            session: None,
            preview_minutes,
            next_progress_secs: 0,
            minutes_credited: 0,
            sessions_finished: 0,
            lesson_key: None,
            time,
            sink,
            event_tx,
        }
    }

    /// Sets the lesson this engine accounts time against.
    pub fn set_lesson_key(&mut self, lesson_key: Option<String>) {
        self.lesson_key = lesson_key;
    }

    /// Returns the current phase.
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    /// Returns a read-only snapshot for status queries.
    ///
    /// While Idle the remaining time shows the full preview duration, so a
    /// reset redisplays the planned countdown without crediting anything.
    pub fn snapshot(&self) -> TimerSnapshot {
        let remaining_ms = match self.phase {
            TimerPhase::Idle => u64::from(self.preview_minutes) * 60_000,
            TimerPhase::Finished => 0,
            TimerPhase::Running | TimerPhase::Paused => self.remaining_ms(),
        };
        TimerSnapshot {
            phase: self.phase,
            remaining_ms,
            planned_seconds: self.clock.as_ref().map(SessionClock::planned_duration_secs),
            minutes_credited: self.minutes_credited,
            sessions_finished: self.sessions_finished,
            lesson_key: self.lesson_key.clone(),
        }
    }

    /// Starts a new session, or resumes a paused one.
    ///
    /// From Idle or Finished, `minutes` is clamped to the valid range (the
    /// configured default when absent) and a fresh session begins. From
    /// Paused the countdown resumes and `minutes` is ignored: the planned
    /// duration of an in-flight session is immutable. No-op while Running.
    ///
    /// Returns true if a transition occurred.
    pub fn start(&mut self, minutes: Option<u32>) -> bool {
        match self.phase {
            TimerPhase::Running => false,
            TimerPhase::Paused => self.resume_paused(),
            TimerPhase::Idle | TimerPhase::Finished => {
                let now = self.time.now_ms();
                let planned_minutes = self.config.clamp_minutes(minutes);
                let planned_seconds = planned_minutes * 60;

                self.preview_minutes = planned_minutes;
                self.clock = Some(SessionClock::begin(planned_seconds, now));
                self.session = Some(SessionMeta::starting_at_ms(now));
                self.next_progress_secs = self.config.progress_interval_secs;
                self.phase = TimerPhase::Running;

                self.emit(TimerEvent::Started { planned_seconds });
                true
            }
        }
    }

    /// Resumes a paused session. No-op in any other phase.
    pub fn resume(&mut self) -> bool {
        if self.phase == TimerPhase::Paused {
            self.resume_paused()
        } else {
            false
        }
    }

    fn resume_paused(&mut self) -> bool {
        let now = self.time.now_ms();
        let Some(clock) = self.clock.as_mut() else {
            return false;
        };
        clock.resume(now);
        let remaining_ms = clock.remaining_ms(now, false);
        self.phase = TimerPhase::Running;

        self.emit(TimerEvent::Resumed { remaining_ms });
        true
    }

    /// Pauses the running countdown, snapshotting the remaining time and
    /// flushing accumulated progress best-effort. No-op unless Running.
    pub fn pause(&mut self) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }

        let now = self.time.now_ms();
        let Some(clock) = self.clock.as_mut() else {
            return false;
        };
        clock.pause(now);
        let remaining_ms = clock.remaining_ms(now, true);
        self.phase = TimerPhase::Paused;

        self.save_progress_now();
        self.emit(TimerEvent::Paused { remaining_ms });
        true
    }

    /// Pauses in response to the host reporting the view hidden or the
    /// process backgrounded.
    ///
    /// The timer never keeps counting invisibly: persisted time reflects
    /// only foregrounded engagement.
    pub fn suspend(&mut self) -> bool {
        if self.phase == TimerPhase::Running {
            tracing::info!("view hidden while running, pausing timer");
            self.pause()
        } else {
            false
        }
    }

    /// Resets to Idle from any phase without crediting any minutes.
    ///
    /// If Running, the current elapsed time is flushed to the sink
    /// best-effort first (last-chance save before teardown).
    pub fn reset(&mut self) -> bool {
        if self.phase == TimerPhase::Running {
            self.save_progress_now();
        }

        self.clock = None;
        self.session = None;
        self.next_progress_secs = 0;
        self.phase = TimerPhase::Idle;

        self.emit(TimerEvent::Reset);
        true
    }

    /// Finishes the session explicitly, crediting elapsed running minutes.
    /// No-op unless Running or Paused.
    ///
    /// Returns the credited minutes if a transition occurred.
    pub fn finish_manual(&mut self) -> Option<u32> {
        if !self.phase.is_in_flight() {
            return None;
        }
        Some(self.finish(Completion::Manual))
    }

    /// Changes the configured duration preview while Idle or Finished.
    ///
    /// Rejected (no-op, returns false) while a session is in flight, so an
    /// edit can never corrupt a running countdown. The value is clamped
    /// silently; the refreshed preview is published as a tick.
    pub fn set_duration_minutes(&mut self, minutes: Option<u32>) -> bool {
        if self.phase.is_in_flight() {
            return false;
        }

        self.preview_minutes = self.config.clamp_minutes(minutes);
        self.emit(TimerEvent::Tick {
            remaining_ms: u64::from(self.preview_minutes) * 60_000,
        });
        true
    }

    /// Advances the countdown: publishes the remaining time, saves progress
    /// at the configured cadence, and performs the automatic finish when the
    /// deadline is reached.
    ///
    /// Only the Running phase ticks, and finishing moves the phase to
    /// Finished, so a second tick observing the same deadline cannot credit
    /// twice.
    pub fn tick(&mut self) {
        if self.phase != TimerPhase::Running {
            return;
        }

        let now = self.time.now_ms();
        let Some(clock) = self.clock.as_ref() else {
            return;
        };
        let remaining_ms = clock.remaining_ms(now, false);
        let elapsed_secs = clock.elapsed_secs(now, false);

        self.emit(TimerEvent::Tick { remaining_ms });

        if remaining_ms == 0 {
            self.finish(Completion::Automatic);
            return;
        }

        if elapsed_secs >= self.next_progress_secs {
            self.save_progress_now();
            let interval = self.config.progress_interval_secs.max(1);
            self.next_progress_secs = (elapsed_secs / interval + 1) * interval;
        }
    }

    /// Current remaining milliseconds of the in-flight session.
    fn remaining_ms(&self) -> u64 {
        let paused = self.phase == TimerPhase::Paused;
        self.clock
            .as_ref()
            .map(|c| c.remaining_ms(self.time.now_ms(), paused))
            .unwrap_or(0)
    }

    /// Completes the session and credits elapsed minutes.
    ///
    /// Manual and automatic completion share the same elapsed-time formula;
    /// pauses during a run reduce the credit either way.
    fn finish(&mut self, completion: Completion) -> u32 {
        let now = self.time.now_ms();
        let paused = self.phase == TimerPhase::Paused;
        let minutes = self
            .clock
            .as_ref()
            .map(|c| c.credited_minutes(now, paused))
            .unwrap_or(0);

        if minutes > 0 {
            // Engine-side bookkeeping stands even if the sink write fails;
            // reconciliation is the caller's concern.
            self.minutes_credited += u64::from(minutes);
            self.sessions_finished += 1;

            if let Some(session) = self.session {
                if let Err(e) = self.sink.credit_minutes(&session, minutes) {
                    tracing::warn!(error = %e, minutes, "failed to persist credited minutes");
                    self.emit(TimerEvent::SaveFailed {
                        message: e.to_string(),
                    });
                }
            }
        }

        self.phase = TimerPhase::Finished;
        self.emit(TimerEvent::Finished {
            minutes_credited: minutes,
            completion,
        });
        minutes
    }

    /// Best-effort save of the current accumulated elapsed seconds.
    fn save_progress_now(&mut self) {
        let paused = self.phase == TimerPhase::Paused;
        let (Some(clock), Some(session)) = (self.clock.as_ref(), self.session) else {
            return;
        };

        let seconds = clock.elapsed_secs(self.time.now_ms(), paused);
        if seconds == 0 {
            return;
        }

        match self.sink.save_progress(&session, seconds) {
            Ok(()) => self.emit(TimerEvent::ProgressSaved { seconds }),
            Err(e) => {
                tracing::warn!(error = %e, seconds, "failed to save progress, will retry");
                self.emit(TimerEvent::SaveFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Publishes an event, ignoring a dropped receiver: the engine keeps
    /// working with nobody listening.
    fn emit(&self, event: TimerEvent) {
        let _ = self.event_tx.send(event);
    }
}

// ============================================================================
// Tests
// ============================================================================
