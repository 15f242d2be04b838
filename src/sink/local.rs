//! Local study-log sink.
//!
//! Persists study time to a JSON file in the user's home directory:
//! a monotonically increasing total of credited minutes, the append-only
//! per-session record log, and the in-flight progress of the current
//! session (so a teardown flush survives a crash).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PersistenceSink, SessionMeta, SinkError, StudySessionRecord};

/// Default study log location, relative to the home directory.
const DEFAULT_LOG_PATH: &str = ".studytimer/study_log.json";

// ============================================================================
// StudyLog
// ============================================================================

/// On-disk layout of the local study log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyLog {
    /// Total credited minutes; only ever increases
    pub total_minutes: u64,
    /// One record per finish event that credited time
    pub sessions: Vec<StudySessionRecord>,
    /// Accumulated seconds of the session currently in flight, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_progress: Option<ProgressEntry>,
}

/// Progress of the in-flight session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// Session the seconds belong to
    pub session_id: Uuid,
    /// Last accepted accumulated seconds
    pub seconds: u64,
}

impl StudyLog {
    /// Loads a study log from `path`, returning an empty log if the file
    /// does not exist yet.
    pub fn load(path: &Path) -> Result<Self, SinkError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| SinkError::Read(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(SinkError::Read(e.to_string())),
        }
    }
}

// ============================================================================
// LocalTotalSink
// ============================================================================

/// File-backed sink accumulating a running total of credited minutes.
#[derive(Debug)]
pub struct LocalTotalSink {
    /// Study log file location
    path: PathBuf,
    /// Cached log contents
    log: StudyLog,
}

impl LocalTotalSink {
    /// Opens (or initializes) the study log at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        let log = StudyLog::load(&path)?;
        Ok(Self { path, log })
    }

    /// Opens the study log at its default home-directory location.
    pub fn open_default() -> Result<Self, SinkError> {
        Self::open(Self::default_path()?)
    }

    /// Returns the default study log path under the home directory.
    pub fn default_path() -> Result<PathBuf, SinkError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SinkError::Unavailable("home directory not found".to_string()))?;
        Ok(home.join(DEFAULT_LOG_PATH))
    }

    /// Total minutes credited so far.
    pub fn total_minutes(&self) -> u64 {
        self.log.total_minutes
    }

    /// The append-only session record log.
    pub fn records(&self) -> &[StudySessionRecord] {
        &self.log.sessions
    }

    fn persist(&self) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SinkError::Write(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&self.log)?;
        fs::write(&self.path, json).map_err(|e| SinkError::Write(e.to_string()))?;
        Ok(())
    }
}

impl PersistenceSink for LocalTotalSink {
    fn credit_minutes(&mut self, session: &SessionMeta, minutes: u32) -> Result<(), SinkError> {
        self.log.total_minutes += u64::from(minutes);
        self.log.sessions.push(StudySessionRecord {
            timestamp: Utc::now(),
            minutes_credited: minutes,
        });

        // The session is over; its progress entry is superseded.
        if matches!(self.log.in_progress, Some(p) if p.session_id == session.id) {
            self.log.in_progress = None;
        }

        self.persist()
    }

    fn save_progress(&mut self, session: &SessionMeta, seconds: u64) -> Result<(), SinkError> {
        match self.log.in_progress {
            Some(existing) if existing.session_id == session.id => {
                if seconds <= existing.seconds {
                    tracing::debug!(
                        seconds,
                        accepted = existing.seconds,
                        "ignoring non-increasing progress save"
                    );
                    return Ok(());
                }
            }
            _ => {}
        }

        self.log.in_progress = Some(ProgressEntry {
            session_id: session.id,
            seconds,
        });
        self.persist()
    }
}

// ============================================================================
// Tests
// ============================================================================
