//! Persistence sinks for completed study time.
//!
//! The timer engine reports time through the `PersistenceSink` trait and
//! never cares where it lands. Two production variants exist, selected by
//! configuration (never by runtime type inspection):
//! - `local`: JSON study log in the user's home directory
//! - `remote`: upsert into a hosted store keyed by (user, lesson, date)
//!
//! `MemorySink` is a recording double for tests and for running without any
//! persistence at all.

pub mod error;
pub mod local;
pub mod memory;
pub mod remote;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::SinkError;
pub use local::LocalTotalSink;
pub use memory::MemorySink;
pub use remote::{EntryKey, FileStudyStore, MemoryStudyStore, RemoteUpsertSink, StudyStore};

// ============================================================================
// SessionMeta
// ============================================================================

/// Identity of the session a save belongs to.
///
/// The id scopes the monotonic progress guard; the start timestamp lets
/// sinks record when the studied interval began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMeta {
    /// Unique id of this timer session
    pub id: Uuid,
    /// When the session left Idle
    pub started_at: DateTime<Utc>,
}

impl SessionMeta {
    /// Creates metadata for a session starting now at the given epoch ms.
    pub fn starting_at_ms(epoch_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: DateTime::from_timestamp_millis(epoch_ms as i64)
                .unwrap_or_else(Utc::now),
        }
    }
}

// ============================================================================
// Persisted record types
// ============================================================================

/// One append-only record per finish event that credited time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySessionRecord {
    /// When the session finished
    pub timestamp: DateTime<Utc>,
    /// Whole minutes credited
    pub minutes_credited: u32,
}

// ============================================================================
// PersistenceSink
// ============================================================================

/// Destination for credited minutes and in-flight progress.
///
/// Implementations must keep totals monotonic: credited minutes only ever
/// accumulate, and a progress save smaller than the last accepted value for
/// the same session is ignored, guarding against out-of-order or duplicate
/// low-value writes.
pub trait PersistenceSink: Send {
    /// Records `minutes` of completed study time for `session`.
    ///
    /// Called at most once per finish event, and only with `minutes > 0`.
    fn credit_minutes(&mut self, session: &SessionMeta, minutes: u32) -> Result<(), SinkError>;

    /// Saves the accumulated elapsed seconds of the in-flight `session`.
    ///
    /// Called periodically while running and on pause. Writes below the last
    /// accepted value for the same session must leave the stored value
    /// untouched and still return `Ok`.
    fn save_progress(&mut self, session: &SessionMeta, seconds: u64) -> Result<(), SinkError>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_meta_from_epoch_ms() {
        let meta = SessionMeta::starting_at_ms(1_700_000_000_000);
        assert_eq!(meta.started_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_session_meta_ids_are_unique() {
        let a = SessionMeta::starting_at_ms(0);
        let b = SessionMeta::starting_at_ms(0);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_study_session_record_roundtrip() {
        let record = StudySessionRecord {
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            minutes_credited: 25,
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: StudySessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
