//! Storage of settings and history outside the process.
//!
//! The pump manager only depends on the [`SettingsStore`] and
//! [`HistoryStore`] traits; [`JsonFileStore`] is the file-backed
//! implementation used by the CLI.

mod json;

pub use json::{JsonFileStore, HISTORY_FILE_PREFIX, SETTINGS_FILE_NAME};

use std::path::PathBuf;

use thiserror::Error;

use crate::pump::{HistoryRecord, SmartPumpSettings};

/// Errors from a settings or history store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode data for '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Stores the settings of every channel.
pub trait SettingsStore: Send + Sync {
    /// Save settings for all channels, index = channel. Returns the location written.
    fn save_settings(&self, settings: &[SmartPumpSettings]) -> Result<PathBuf, PersistenceError>;

    /// Load previously saved settings, `None` if nothing was saved.
    fn load_settings(&self) -> Result<Option<Vec<SmartPumpSettings>>, PersistenceError>;
}

/// Stores the status history of each channel.
pub trait HistoryStore: Send + Sync {
    /// Save one channel's history. Returns the location written.
    fn save_history(&self, channel: u32, record: &HistoryRecord)
        -> Result<PathBuf, PersistenceError>;

    /// Load one channel's history, `None` if nothing was saved.
    fn load_history(&self, channel: u32) -> Result<Option<HistoryRecord>, PersistenceError>;
}
