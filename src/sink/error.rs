//! Persistence sink error types.
//!
//! Sink failures are never fatal to the timer: the engine absorbs them,
//! keeps its state, and retries at the next save opportunity. These types
//! exist so callers can report "could not save, will retry" accurately.

use thiserror::Error;

/// Errors that can occur while persisting study time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The study log could not be read.
    #[error("failed to read study log: {0}")]
    Read(String),

    /// The study log could not be written.
    #[error("failed to write study log: {0}")]
    Write(String),

    /// A record could not be encoded or decoded.
    #[error("failed to encode study record: {0}")]
    Serialization(String),

    /// The backing store rejected or failed the write.
    #[error("study backend error: {0}")]
    Backend(String),

    /// No usable storage location (e.g. no home directory).
    #[error("storage location unavailable: {0}")]
    Unavailable(String),
}

impl SinkError {
    /// Returns true if a later save attempt may succeed.
    ///
    /// Every sink failure is treated as transient; credited-minutes
    /// bookkeeping on the engine side is never rolled back.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        true
    }
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Write(err.to_string())
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        SinkError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SinkError::Read("permission denied".to_string());
        assert!(err.to_string().contains("read study log"));
        assert!(err.to_string().contains("permission denied"));

        let err = SinkError::Backend("conflict".to_string());
        assert!(err.to_string().contains("backend"));
    }

    #[test]
    fn test_all_errors_are_retryable() {
        let errors = [
            SinkError::Read("x".to_string()),
            SinkError::Write("x".to_string()),
            SinkError::Serialization("x".to_string()),
            SinkError::Backend("x".to_string()),
            SinkError::Unavailable("x".to_string()),
        ];
        for err in errors {
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SinkError = io.into();
        assert!(matches!(err, SinkError::Write(_)));
    }

    #[test]
    fn test_from_serde_error() {
        let bad = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: SinkError = bad.into();
        assert!(matches!(err, SinkError::Serialization(_)));
    }
}
