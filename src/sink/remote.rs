//! Remote upsert sink.
//!
//! Mirrors the hosted-database variant of study-time persistence: credited
//! minutes are upserted into an entries table keyed by (user, lesson,
//! logical date), and each finished session appends a chunk row with its
//! start/end timestamps. The backend itself is opaque behind the
//! `StudyStore` trait; the sink owns the keying and the monotonic progress
//! guard.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PersistenceSink, SessionMeta, SinkError};

// ============================================================================
// Keys and rows
// ============================================================================

/// Upsert key for accumulated daily minutes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryKey {
    /// Owning user
    pub user_id: Uuid,
    /// Lesson the time was studied against
    pub lesson_key: String,
    /// Logical date the minutes count toward
    pub date: NaiveDate,
}

/// One appended row per finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyChunk {
    /// Owning user
    pub user_id: Uuid,
    /// Lesson key
    pub lesson_key: String,
    /// Session the chunk belongs to
    pub session_id: Uuid,
    /// Credited seconds
    pub seconds: u64,
    /// When the session started
    pub started_at: DateTime<Utc>,
    /// When the session finished
    pub ended_at: DateTime<Utc>,
}

// ============================================================================
// StudyStore
// ============================================================================

/// Opaque upsert/append-capable backend.
///
/// Stores accept a key and a value and keep the latest; ordering guarantees
/// live in the sink, not here.
pub trait StudyStore: Send {
    /// Adds `minutes` to the entry at `key`, creating it if absent.
    fn add_minutes(&mut self, key: &EntryKey, minutes: u32) -> Result<(), SinkError>;

    /// Appends a finished-session chunk row.
    fn append_chunk(&mut self, chunk: StudyChunk) -> Result<(), SinkError>;

    /// Stores the latest accumulated seconds for an in-flight session.
    fn put_progress(&mut self, session_id: Uuid, seconds: u64) -> Result<(), SinkError>;
}

// ============================================================================
// MemoryStudyStore
// ============================================================================

/// In-memory store, for tests and offline operation.
#[derive(Debug, Default)]
pub struct MemoryStudyStore {
    /// Accumulated minutes per (user, lesson, date)
    pub entries: HashMap<EntryKey, u32>,
    /// Appended chunk rows, in order
    pub chunks: Vec<StudyChunk>,
    /// Latest progress per session
    pub progress: HashMap<Uuid, u64>,
    /// When true, every write fails (simulated outage)
    pub offline: bool,
}

impl MemoryStudyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn check_online(&self) -> Result<(), SinkError> {
        if self.offline {
            return Err(SinkError::Backend("store unreachable".to_string()));
        }
        Ok(())
    }
}

impl StudyStore for MemoryStudyStore {
    fn add_minutes(&mut self, key: &EntryKey, minutes: u32) -> Result<(), SinkError> {
        self.check_online()?;
        *self.entries.entry(key.clone()).or_insert(0) += minutes;
        Ok(())
    }

    fn append_chunk(&mut self, chunk: StudyChunk) -> Result<(), SinkError> {
        self.check_online()?;
        self.chunks.push(chunk);
        Ok(())
    }

    fn put_progress(&mut self, session_id: Uuid, seconds: u64) -> Result<(), SinkError> {
        self.check_online()?;
        self.progress.insert(session_id, seconds);
        Ok(())
    }
}

// ============================================================================
// FileStudyStore
// ============================================================================

/// JSON-file store, the durable default when no hosted backend is wired.
#[derive(Debug)]
pub struct FileStudyStore {
    path: PathBuf,
    state: FileStoreState,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileStoreState {
    entries: Vec<(EntryKey, u32)>,
    chunks: Vec<StudyChunk>,
    #[serde(default)]
    progress: HashMap<Uuid, u64>,
}

impl FileStudyStore {
    /// Opens (or initializes) the store file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| SinkError::Read(e.to_string()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileStoreState::default(),
            Err(e) => return Err(SinkError::Read(e.to_string())),
        };
        Ok(Self { path, state })
    }

    /// Minutes stored at `key`, if any.
    pub fn minutes_at(&self, key: &EntryKey) -> Option<u32> {
        self.state
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, m)| *m)
    }

    fn persist(&self) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SinkError::Write(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&self.state)?;
        fs::write(&self.path, json).map_err(|e| SinkError::Write(e.to_string()))?;
        Ok(())
    }
}

impl StudyStore for FileStudyStore {
    fn add_minutes(&mut self, key: &EntryKey, minutes: u32) -> Result<(), SinkError> {
        match self.state.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing += minutes,
            None => self.state.entries.push((key.clone(), minutes)),
        }
        self.persist()
    }

    fn append_chunk(&mut self, chunk: StudyChunk) -> Result<(), SinkError> {
        self.state.chunks.push(chunk);
        self.persist()
    }

    fn put_progress(&mut self, session_id: Uuid, seconds: u64) -> Result<(), SinkError> {
        self.state.progress.insert(session_id, seconds);
        self.persist()
    }
}

// ============================================================================
// RemoteUpsertSink
// ============================================================================

/// Sink that upserts study time into a `StudyStore` on behalf of one user
/// and lesson.
pub struct RemoteUpsertSink<S: StudyStore> {
    store: S,
    user_id: Uuid,
    lesson_key: String,
    /// Last accepted progress seconds per session (monotonic guard)
    accepted_progress: HashMap<Uuid, u64>,
}

impl<S: StudyStore> RemoteUpsertSink<S> {
    /// Creates a sink writing to `store` for the given user and lesson.
    pub fn new(store: S, user_id: Uuid, lesson_key: impl Into<String>) -> Self {
        Self {
            store,
            user_id,
            lesson_key: lesson_key.into(),
            accepted_progress: HashMap::new(),
        }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Upsert key for minutes finishing at `ended_at`.
    fn entry_key(&self, ended_at: DateTime<Utc>) -> EntryKey {
        EntryKey {
            user_id: self.user_id,
            lesson_key: self.lesson_key.clone(),
            date: ended_at.date_naive(),
        }
    }
}

impl<S: StudyStore> PersistenceSink for RemoteUpsertSink<S> {
    fn credit_minutes(&mut self, session: &SessionMeta, minutes: u32) -> Result<(), SinkError> {
        let ended_at = Utc::now();
        self.store.add_minutes(&self.entry_key(ended_at), minutes)?;
        self.store.append_chunk(StudyChunk {
            user_id: self.user_id,
            lesson_key: self.lesson_key.clone(),
            session_id: session.id,
            seconds: u64::from(minutes) * 60,
            started_at: session.started_at,
            ended_at,
        })?;
        self.accepted_progress.remove(&session.id);
        Ok(())
    }

    fn save_progress(&mut self, session: &SessionMeta, seconds: u64) -> Result<(), SinkError> {
        if let Some(&accepted) = self.accepted_progress.get(&session.id) {
            if seconds <= accepted {
                tracing::debug!(
                    seconds,
                    accepted,
                    "ignoring non-increasing progress save"
                );
                return Ok(());
            }
        }

        self.store.put_progress(session.id, seconds)?;
        self.accepted_progress.insert(session.id, seconds);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
