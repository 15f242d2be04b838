//! Daemon for the study timer.
//!
//! The daemon owns the timer engine and serves commands over a Unix socket:
//! - A tick task drives the engine every 250ms
//! - An accept loop answers IPC requests
//! - SIGINT/SIGTERM flush in-flight progress before exit
//!
//! Ticks and IPC commands share the engine behind one async mutex, so a
//! command arriving in the same instant as the deadline is serialized
//! against the automatic finish.

pub mod ipc;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::AppConfig;
use crate::engine::{TimerEngine, TimerEvent};

pub use ipc::{IpcServer, RequestHandler, SOCKET_FILE};

/// Tick cadence for the countdown.
const TICK_INTERVAL_MS: u64 = 250;

/// Returns the daemon socket path under the application directory.
pub fn socket_path() -> Result<PathBuf> {
    Ok(AppConfig::app_dir()?.join(SOCKET_FILE))
}

/// Runs the daemon until interrupted.
pub async fn run(config: AppConfig) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let sink = config.build_sink()?;
    let mut engine = TimerEngine::new(config.timer_config(), sink, event_tx);
    engine.set_lesson_key(Some(config.lesson_key.clone()));
    let engine = Arc::new(Mutex::new(engine));

    let server = IpcServer::new(&socket_path()?)?;
    tracing::info!(socket = ?server.socket_path(), "daemon listening");

    let tick_handle = tokio::spawn(run_tick_loop(Arc::clone(&engine)));
    let event_handle = tokio::spawn(log_events(event_rx));

    let result = serve(&server, Arc::clone(&engine)).await;

    tick_handle.abort();
    event_handle.abort();

    // Last-chance progress flush: pausing a running session saves its
    // accumulated seconds without crediting anything.
    engine.lock().await.suspend();
    tracing::info!("daemon stopped");

    result
}

/// Accept loop, interrupted by SIGINT.
async fn serve(server: &IpcServer, engine: Arc<Mutex<TimerEngine>>) -> Result<()> {
    let handler = RequestHandler::new(engine);

    loop {
        tokio::select! {
            accepted = server.accept() => {
                let mut stream = accepted?;
                match IpcServer::receive_request(&mut stream).await {
                    Ok(request) => {
                        tracing::debug!(?request, "handling request");
                        let response = handler.handle(request).await;
                        if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
                            tracing::warn!(error = %e, "failed to send response");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "invalid request");
                        let response = crate::types::IpcResponse::error(e.to_string());
                        let _ = IpcServer::send_response(&mut stream, &response).await;
                    }
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for shutdown signal")?;
                tracing::info!("shutdown signal received");
                return Ok(());
            }
        }
    }
}

/// Drives the engine at the tick cadence.
///
/// A host that throttles or suspends the task skips missed ticks; the
/// engine recomputes remaining time from the wall clock, so the next tick
/// lands on the correct value (or performs the finish) regardless of how
/// many were lost.
async fn run_tick_loop(engine: Arc<Mutex<TimerEngine>>) {
    let mut ticker = interval(Duration::from_millis(TICK_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        engine.lock().await.tick();
    }
}

/// Logs engine events at appropriate levels.
async fn log_events(mut rx: mpsc::UnboundedReceiver<TimerEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            TimerEvent::Tick { .. } => {}
            TimerEvent::Started { planned_seconds } => {
                tracing::info!(planned_seconds, "session started");
            }
            TimerEvent::Paused { remaining_ms } => {
                tracing::info!(remaining_ms, "session paused");
            }
            TimerEvent::Resumed { remaining_ms } => {
                tracing::info!(remaining_ms, "session resumed");
            }
            TimerEvent::Reset => tracing::info!("session reset"),
            TimerEvent::Finished {
                minutes_credited,
                completion,
            } => {
                tracing::info!(minutes_credited, ?completion, "session finished");
            }
            TimerEvent::ProgressSaved { seconds } => {
                tracing::debug!(seconds, "progress saved");
            }
            TimerEvent::SaveFailed { message } => {
                tracing::warn!(message, "save failed");
            }
        }
    }
}
