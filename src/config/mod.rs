//! Application configuration.
//!
//! Loaded from a JSON file under the home directory. Every field has a
//! serde default, so a partial or empty file still yields a working
//! configuration, and unknown fields are ignored for forward compatibility.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sink::{FileStudyStore, LocalTotalSink, PersistenceSink, RemoteUpsertSink};
use crate::types::DEFAULT_MINUTES;

/// Application directory under the home directory.
const APP_DIR: &str = ".studytimer";

/// Configuration file name inside the application directory.
const CONFIG_FILE: &str = "config.json";

/// Remote store file name inside the application directory.
const STORE_FILE: &str = "entries.json";

/// Default planned duration in minutes.
fn default_minutes() -> u32 {
    DEFAULT_MINUTES
}

/// Default elapsed seconds between periodic progress saves.
fn default_progress_interval_secs() -> u64 {
    30
}

/// Default lesson key when none is configured.
fn default_lesson_key() -> String {
    "general".to_string()
}

// ============================================================================
// SinkKind
// ============================================================================

/// Which persistence sink the daemon wires in.
///
/// Selection happens here, once, from configuration; nothing downstream
/// inspects sink types at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Aggregate study log in the home directory
    #[default]
    Local,
    /// Per-user, per-lesson, per-day entry store
    Remote,
}

// ============================================================================
// AppConfig
// ============================================================================

/// Study timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Planned duration in minutes used when `start` gives no value.
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,

    /// Elapsed seconds of running time between periodic progress saves.
    #[serde(default = "default_progress_interval_secs")]
    pub progress_interval_secs: u64,

    /// Which sink credited time is persisted to.
    #[serde(default)]
    pub sink: SinkKind,

    /// User identity for the remote sink.
    #[serde(default)]
    pub user_id: Option<Uuid>,

    /// Lesson the timer accounts time against.
    #[serde(default = "default_lesson_key")]
    pub lesson_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_minutes(),
            progress_interval_secs: default_progress_interval_secs(),
            sink: SinkKind::default(),
            user_id: None,
            lesson_key: default_lesson_key(),
        }
    }
}

impl AppConfig {
    /// Returns the application directory under the home directory.
    pub fn app_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(APP_DIR))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join(CONFIG_FILE))
    }

    /// Loads the configuration from `path`, falling back to defaults when
    /// the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file: {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read config: {}", path.display()))
            }
        }
    }

    /// Loads the configuration from its default location.
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// Saves the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Converts to the engine-facing timer configuration.
    pub fn timer_config(&self) -> crate::types::TimerConfig {
        crate::types::TimerConfig {
            default_minutes: self.default_minutes,
            progress_interval_secs: self.progress_interval_secs,
        }
    }

    /// Builds the persistence sink this configuration selects.
    ///
    /// A remote sink without a configured user identity cannot key its
    /// entries, so it degrades to the local study log rather than failing
    /// the daemon.
    pub fn build_sink(&self) -> Result<Box<dyn PersistenceSink>> {
        match (self.sink, self.user_id) {
            (SinkKind::Remote, Some(user_id)) => {
                let store = FileStudyStore::open(Self::app_dir()?.join(STORE_FILE))
                    .context("Failed to open entry store")?;
                Ok(Box::new(RemoteUpsertSink::new(
                    store,
                    user_id,
                    self.lesson_key.clone(),
                )))
            }
            (SinkKind::Remote, None) => {
                tracing::warn!("remote sink configured without user_id, using local study log");
                Ok(Box::new(
                    LocalTotalSink::open_default().context("Failed to open study log")?,
                ))
            }
            (SinkKind::Local, _) => Ok(Box::new(
                LocalTotalSink::open_default().context("Failed to open study log")?,
            )),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
