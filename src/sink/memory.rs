//! In-memory recording sink.
//!
//! Used as a test double and as the no-persistence fallback. Records every
//! call so tests can assert exactly what the engine reported, and can be
//! told to fail to exercise the engine's best-effort save semantics.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::{PersistenceSink, SessionMeta, SinkError};

/// Shared view into a `MemorySink`'s recordings.
///
/// The sink is moved into the engine; tests keep this handle.
#[derive(Debug, Default)]
pub struct MemorySinkState {
    /// Every credit call, in order: (session id, minutes)
    pub credits: Vec<(Uuid, u32)>,
    /// Last accepted progress seconds per session
    pub progress: HashMap<Uuid, u64>,
    /// When true, the next save of either kind fails
    pub fail_next: bool,
}

impl MemorySinkState {
    /// Sum of all credited minutes.
    pub fn total_minutes(&self) -> u64 {
        self.credits.iter().map(|(_, m)| u64::from(*m)).sum()
    }
}

/// Recording sink backed by shared in-memory state.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemorySinkState>>,
}

impl MemorySink {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the shared recordings.
    pub fn state(&self) -> Arc<Mutex<MemorySinkState>> {
        Arc::clone(&self.state)
    }

    /// Arranges for the next save call to fail.
    pub fn fail_next(&self) {
        Self::lock(&self.state).fail_next = true;
    }

    fn lock(state: &Arc<Mutex<MemorySinkState>>) -> std::sync::MutexGuard<'_, MemorySinkState> {
        state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn take_failure(state: &mut MemorySinkState) -> Result<(), SinkError> {
        if state.fail_next {
            state.fail_next = false;
            return Err(SinkError::Backend("injected failure".to_string()));
        }
        Ok(())
    }
}

impl PersistenceSink for MemorySink {
    fn credit_minutes(&mut self, session: &SessionMeta, minutes: u32) -> Result<(), SinkError> {
        let mut state = Self::lock(&self.state);
        Self::take_failure(&mut state)?;
        state.credits.push((session.id, minutes));
        Ok(())
    }

    fn save_progress(&mut self, session: &SessionMeta, seconds: u64) -> Result<(), SinkError> {
        let mut state = Self::lock(&self.state);
        Self::take_failure(&mut state)?;

        let entry = state.progress.entry(session.id).or_insert(0);
        if seconds > *entry {
            *entry = seconds;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
