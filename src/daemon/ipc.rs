//! IPC server for the study timer daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer commands
//! - Integration with TimerEngine for command execution
//!
//! Commands that arrive in a phase where they do not apply are answered
//! with a success response describing the unchanged state; the engine has
//! no fatal command errors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

use crate::engine::TimerEngine;
use crate::types::{IpcRequest, IpcResponse, ResponseData, StartParams, TimerPhase};

// ============================================================================
// Constants
// ============================================================================

/// Socket file name inside the application directory.
pub const SOCKET_FILE: &str = "studytimer.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            anyhow::bail!("Connection closed by client");
        }
        if n >= MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .context("Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to TimerEngine.
pub struct RequestHandler {
    /// Shared reference to the timer engine
    engine: Arc<Mutex<TimerEngine>>,
}

impl RequestHandler {
    /// Creates a new request handler with the given timer engine.
    pub fn new(engine: Arc<Mutex<TimerEngine>>) -> Self {
        Self { engine }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start { params } => self.handle_start(params).await,
            IpcRequest::Pause => self.handle_pause().await,
            IpcRequest::Resume => self.handle_resume().await,
            IpcRequest::Reset => self.handle_reset().await,
            IpcRequest::Finish => self.handle_finish().await,
            IpcRequest::Status => self.handle_status().await,
        }
    }

    /// Handles the start command.
    ///
    /// From Paused this resumes; while Running it reports the unchanged
    /// countdown.
    async fn handle_start(&self, params: StartParams) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        let was_paused = engine.phase() == TimerPhase::Paused;
        let transitioned = engine.start(params.minutes);

        let message = match (transitioned, was_paused) {
            (true, true) => "Timer resumed",
            (true, false) => "Timer started",
            (false, _) => "Timer already running",
        };
        IpcResponse::success(message, Some(ResponseData::from_snapshot(&engine.snapshot())))
    }

    /// Handles the pause command.
    async fn handle_pause(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        let message = if engine.pause() {
            "Timer paused"
        } else {
            "No running timer to pause"
        };
        IpcResponse::success(message, Some(ResponseData::from_snapshot(&engine.snapshot())))
    }

    /// Handles the resume command.
    async fn handle_resume(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        let message = if engine.resume() {
            "Timer resumed"
        } else {
            "No paused timer to resume"
        };
        IpcResponse::success(message, Some(ResponseData::from_snapshot(&engine.snapshot())))
    }

    /// Handles the reset command.
    async fn handle_reset(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        engine.reset();
        IpcResponse::success(
            "Timer reset",
            Some(ResponseData::from_snapshot(&engine.snapshot())),
        )
    }

    /// Handles the finish command.
    async fn handle_finish(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        match engine.finish_manual() {
            Some(minutes) => {
                let data = ResponseData::from_snapshot(&engine.snapshot()).with_credited(minutes);
                let message = if minutes > 0 {
                    format!("Session finished, {} min credited", minutes)
                } else {
                    "Session finished, under a minute studied".to_string()
                };
                IpcResponse::success(message, Some(data))
            }
            None => IpcResponse::success(
                "No session to finish",
                Some(ResponseData::from_snapshot(&engine.snapshot())),
            ),
        }
    }

    /// Handles the status command.
    async fn handle_status(&self) -> IpcResponse {
        let engine = self.engine.lock().await;
        IpcResponse::success("", Some(ResponseData::from_snapshot(&engine.snapshot())))
    }
}

// ============================================================================
// Tests
// ============================================================================
