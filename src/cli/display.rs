//! Display utilities for the study timer CLI.
//!
//! This module provides formatted output for:
//! - Command acknowledgements
//! - Status display
//! - The accumulated study log

use crate::engine::format_mm_ss;
use crate::sink::StudySessionRecord;
use crate::types::IpcResponse;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the daemon's acknowledgement with the remaining time.
    pub fn show_ack(response: &IpcResponse) {
        println!("{}", response.message);

        if let Some(data) = &response.data {
            if let Some(remaining) = data.remaining_ms {
                println!("  remaining: {}", format_mm_ss(remaining));
            }
        }
    }

    /// Shows the result of a finish command.
    pub fn show_finish(response: &IpcResponse) {
        println!("{}", response.message);

        if let Some(data) = &response.data {
            if let Some(total) = data.minutes_credited {
                println!("  total studied: {} min", total);
            }
        }
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        println!("Study Timer Status");
        println!("------------------");

        if let Some(data) = &response.data {
            let state = data.state.as_deref().unwrap_or("unknown");
            println!("state: {}", state);

            if let Some(remaining) = data.remaining_ms {
                println!("remaining: {}", format_mm_ss(remaining));
            }
            if let Some(lesson) = &data.lesson_key {
                println!("lesson: {}", lesson);
            }
            if let Some(total) = data.minutes_credited {
                println!("studied: {} min across {} sessions",
                    total,
                    data.sessions_finished.unwrap_or(0));
            }
        } else {
            println!("The daemon is not running");
        }
    }

    /// Shows the accumulated study log.
    pub fn show_log(total_minutes: u64, records: &[StudySessionRecord]) {
        println!("Study Log");
        println!("---------");
        println!("total: {} min", total_minutes);

        for record in records {
            println!(
                "  {}  {} min",
                record.timestamp.format("%Y-%m-%d %H:%M"),
                record.minutes_credited
            );
        }

        if records.is_empty() {
            println!("  no finished sessions yet");
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }
}

// ============================================================================
// Tests
// ============================================================================
