//! Wall-clock session accounting.
//!
//! All elapsed-time arithmetic for a timer session lives here, in one place:
//! - `SessionClock` tracks the anchors and the paused-time fold
//! - `TimeSource` abstracts "now" so tests can drive simulated time
//!
//! Remaining time is always recomputed from wall-clock deltas, never by
//! decrementing a counter per tick, so a throttled or suspended host cannot
//! make the countdown drift.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

// ============================================================================
// TimeSource
// ============================================================================

/// Supplies the current time as milliseconds since the Unix epoch.
pub trait TimeSource: Send + Sync {
    /// Returns the current epoch time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// System clock time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Manually advanced time source for tests.
///
/// Shared handles observe the same instant, so a test can hold one clone and
/// hand another to the engine.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now_ms: AtomicU64,
}

impl ManualTimeSource {
    /// Creates a manual time source starting at the given epoch millisecond.
    pub fn starting_at(now_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            now_ms: AtomicU64::new(now_ms),
        })
    }

    /// Advances the clock by the given number of milliseconds.
    pub fn advance_ms(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Advances the clock by the given number of seconds.
    pub fn advance_secs(&self, delta_secs: u64) {
        self.advance_ms(delta_secs * 1000);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

// ============================================================================
// SessionClock
// ============================================================================

/// Time bookkeeping for one timer session.
///
/// Invariant: across any pause/resume cycle,
/// `end_at_ms - session_anchor_ms - paused_accum_ms` equals the planned
/// duration, i.e. pausing never gains or loses countdown time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    /// Planned countdown length in seconds
    planned_duration_secs: u32,
    /// When the session left Idle; the basis for all elapsed computation
    session_anchor_ms: u64,
    /// When the current running interval began (reset on every resume)
    started_at_ms: u64,
    /// Deadline of the countdown
    end_at_ms: u64,
    /// Total milliseconds spent paused since the session anchor
    paused_accum_ms: u64,
    /// When the most recent pause began
    last_pause_at_ms: u64,
    /// Remaining time captured at the moment of pause
    remaining_snapshot_ms: u64,
}

impl SessionClock {
    /// Begins a new session of `planned_duration_secs` at `now_ms`.
    pub fn begin(planned_duration_secs: u32, now_ms: u64) -> Self {
        Self {
            planned_duration_secs,
            session_anchor_ms: now_ms,
            started_at_ms: now_ms,
            end_at_ms: now_ms + u64::from(planned_duration_secs) * 1000,
            paused_accum_ms: 0,
            last_pause_at_ms: 0,
            remaining_snapshot_ms: 0,
        }
    }

    /// Returns the planned duration in seconds.
    pub fn planned_duration_secs(&self) -> u32 {
        self.planned_duration_secs
    }

    /// Remaining countdown time at `now_ms`, clamped at zero.
    ///
    /// While paused the snapshot taken at pause time is authoritative.
    pub fn remaining_ms(&self, now_ms: u64, paused: bool) -> u64 {
        if paused {
            self.remaining_snapshot_ms
        } else {
            self.end_at_ms.saturating_sub(now_ms)
        }
    }

    /// Records a pause at `now_ms`: snapshots the remaining time and marks
    /// when the pause gap began.
    pub fn pause(&mut self, now_ms: u64) {
        self.remaining_snapshot_ms = self.end_at_ms.saturating_sub(now_ms);
        self.last_pause_at_ms = now_ms;
    }

    /// Resumes at `now_ms`: folds the pause gap into `paused_accum_ms` and
    /// pushes the deadline out by exactly the snapshotted remainder.
    ///
    /// `started_at_ms` is reset for bookkeeping only; elapsed time is always
    /// computed from the session anchor.
    pub fn resume(&mut self, now_ms: u64) {
        self.paused_accum_ms += now_ms.saturating_sub(self.last_pause_at_ms);
        self.end_at_ms = now_ms + self.remaining_snapshot_ms;
        self.started_at_ms = now_ms;
    }

    /// Elapsed running time at `now_ms` in milliseconds.
    ///
    /// This is the only place elapsed time is derived: time since the session
    /// anchor, minus accumulated pauses. While paused the basis is the moment
    /// the pause began, so paused wall time never counts. Both the manual and
    /// the automatic finish path credit from this value.
    pub fn elapsed_ms(&self, now_ms: u64, paused: bool) -> u64 {
        let basis = if paused { self.last_pause_at_ms } else { now_ms };
        basis
            .saturating_sub(self.session_anchor_ms)
            .saturating_sub(self.paused_accum_ms)
    }

    /// Elapsed running time converted to whole credited minutes (rounded to
    /// the nearest minute, so a few seconds credit nothing).
    pub fn credited_minutes(&self, now_ms: u64, paused: bool) -> u32 {
        let elapsed = self.elapsed_ms(now_ms, paused);
        ((elapsed + 30_000) / 60_000) as u32
    }

    /// Elapsed running time in whole seconds, for progress saves.
    pub fn elapsed_secs(&self, now_ms: u64, paused: bool) -> u64 {
        self.elapsed_ms(now_ms, paused) / 1000
    }
}

// ============================================================================
// Display formatting
// ============================================================================

/// Formats remaining milliseconds as `MM:SS` (rounded to the nearest second).
pub fn format_mm_ss(remaining_ms: u64) -> String {
    let total_secs = (remaining_ms + 500) / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

// ============================================================================
// Tests
// ============================================================================
