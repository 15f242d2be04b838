//! Core data types for the study timer.
//!
//! This module defines the data structures used for:
//! - Timer phase and read-only status snapshots
//! - Timer configuration with duration clamping
//! - IPC request/response serialization

use serde::{Deserialize, Serialize};

// ============================================================================
// Duration bounds
// ============================================================================

/// Minimum planned duration in minutes.
pub const MIN_MINUTES: u32 = 1;

/// Maximum planned duration in minutes.
pub const MAX_MINUTES: u32 = 60;

/// Fallback duration in minutes when no value is supplied.
pub const DEFAULT_MINUTES: u32 = 25;

// ============================================================================
// TimerPhase
// ============================================================================

/// Represents the current phase of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// No session in progress
    Idle,
    /// Countdown in progress
    Running,
    /// Countdown suspended, remaining time snapshotted
    Paused,
    /// Terminal display state; a new start reinitializes
    Finished,
}

impl TimerPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
            TimerPhase::Finished => "finished",
        }
    }

    /// Returns true if the timer is actively counting down.
    pub fn is_running(&self) -> bool {
        matches!(self, TimerPhase::Running)
    }

    /// Returns true if a session is in flight (running or paused).
    ///
    /// The planned duration is immutable while this holds.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, TimerPhase::Running | TimerPhase::Paused)
    }
}

impl Default for TimerPhase {
    fn default() -> Self {
        TimerPhase::Idle
    }
}

// ============================================================================
// TimerConfig
// ============================================================================

/// Configuration for the study timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Planned duration in minutes used when `start` gives no value (1-60)
    pub default_minutes: u32,
    /// Seconds of elapsed running time between periodic progress saves
    pub progress_interval_secs: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_minutes: DEFAULT_MINUTES,
            progress_interval_secs: 30,
        }
    }
}

impl TimerConfig {
    /// Creates a new configuration with the specified default duration.
    pub fn with_default_minutes(mut self, minutes: u32) -> Self {
        self.default_minutes = minutes;
        self
    }

    /// Coerces a requested duration into the valid range.
    ///
    /// Out-of-range values are clamped to the nearest bound; a missing value
    /// falls back to `default_minutes` (itself clamped, so a corrupt config
    /// file cannot smuggle an invalid duration in).
    pub fn clamp_minutes(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_minutes)
            .clamp(MIN_MINUTES, MAX_MINUTES)
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Read-only view of the engine state, for status queries and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Current phase
    pub phase: TimerPhase,
    /// Remaining milliseconds in the countdown (0 when no session)
    pub remaining_ms: u64,
    /// Planned duration of the in-flight session, in seconds
    pub planned_seconds: Option<u32>,
    /// Whole minutes credited across all finished sessions of this engine
    pub minutes_credited: u64,
    /// Number of finish events (manual or automatic) that credited time
    pub sessions_finished: u32,
    /// Lesson this engine is accounting time against (if any)
    pub lesson_key: Option<String>,
}

// ============================================================================
// IPC Types
// ============================================================================

/// Parameters for the start command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartParams {
    /// Planned duration in minutes
    #[serde(rename = "minutes", skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
}

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start a new session, or resume a paused one
    Start {
        /// Start parameters
        #[serde(flatten)]
        params: StartParams,
    },
    /// Pause the running countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Reset to idle without crediting
    Reset,
    /// Finish the session and credit elapsed minutes
    Finish,
    /// Query the current status
    Status,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current phase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Remaining milliseconds
    #[serde(rename = "remainingMs", skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<u64>,
    /// Planned duration in seconds
    #[serde(rename = "plannedSeconds", skip_serializing_if = "Option::is_none")]
    pub planned_seconds: Option<u32>,
    /// Minutes credited by the finish that produced this response
    #[serde(rename = "creditedMinutes", skip_serializing_if = "Option::is_none")]
    pub credited_minutes: Option<u32>,
    /// Total minutes credited by this engine
    #[serde(rename = "minutesCredited", skip_serializing_if = "Option::is_none")]
    pub minutes_credited: Option<u64>,
    /// Number of finished sessions
    #[serde(rename = "sessionsFinished", skip_serializing_if = "Option::is_none")]
    pub sessions_finished: Option<u32>,
    /// Lesson key
    #[serde(rename = "lessonKey", skip_serializing_if = "Option::is_none")]
    pub lesson_key: Option<String>,
}

impl ResponseData {
    /// Creates response data from an engine snapshot.
    pub fn from_snapshot(snapshot: &TimerSnapshot) -> Self {
        Self {
            state: Some(snapshot.phase.as_str().to_string()),
            remaining_ms: Some(snapshot.remaining_ms),
            planned_seconds: snapshot.planned_seconds,
            credited_minutes: None,
            minutes_credited: Some(snapshot.minutes_credited),
            sessions_finished: Some(snapshot.sessions_finished),
            lesson_key: snapshot.lesson_key.clone(),
        }
    }

    /// Attaches the minutes credited by a finish event.
    pub fn with_credited(mut self, minutes: u32) -> Self {
        self.credited_minutes = Some(minutes);
        self
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
