//! Study Timer Library
//!
//! This library provides the core functionality for the study timer CLI.
//! It includes:
//! - Timer engine with wall-clock countdown and pause accounting
//! - Persistence sinks for credited study time (local log or remote store)
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities
//! - Type definitions for configuration and state

pub mod cli;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod sink;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{AppConfig, SinkKind};
pub use engine::{
    format_mm_ss, Completion, ManualTimeSource, SessionClock, SystemTimeSource, TimeSource,
    TimerEngine, TimerEvent,
};
pub use sink::{
    LocalTotalSink, MemorySink, PersistenceSink, RemoteUpsertSink, SessionMeta, SinkError,
};
pub use types::{
    IpcRequest, IpcResponse, ResponseData, StartParams, TimerConfig, TimerPhase, TimerSnapshot,
};
