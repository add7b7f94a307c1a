//! Default values and constants for all configuration settings.
//!
//! Contains the `DEFAULT_*` constants that are not owned by an engine
//! module, and the `ConfigFile::default()` implementation.

use std::path::PathBuf;

use super::settings::*;
use crate::device::{
    DEFAULT_BAUD_RATE, DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::pump::{DEFAULT_AUTO_SAVE_INTERVAL, DEFAULT_STATUS_UPDATE_INTERVAL};
use crate::status_log::{
    DEFAULT_LOW_RES_INTERVAL_S, DEFAULT_LOW_RES_MAX_AGE_S, DEFAULT_SWITCHOVER_AGE_S,
};

/// Default number of pump channels on one device.
pub const DEFAULT_NUM_CHANNELS: u32 = 6;

/// Upper bound on the channel count accepted from config.
pub const MAX_NUM_CHANNELS: u32 = 64;

/// Name of the config directory under the user's home.
pub const CONFIG_DIR_NAME: &str = ".waterer";

/// Name of the log file inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "waterer.log";

/// Get the default config/storage directory (~/.waterer).
pub fn default_storage_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

impl Default for ConfigFile {
    fn default() -> Self {
        let storage_dir = default_storage_dir();
        Self {
            device: DeviceSettings {
                port: None,
                baud_rate: DEFAULT_BAUD_RATE,
                handshake_timeout_secs: DEFAULT_HANDSHAKE_TIMEOUT_SECS,
                request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                fallback: false,
            },
            controller: ControllerSettings {
                num_channels: DEFAULT_NUM_CHANNELS,
                status_update_interval_secs: DEFAULT_STATUS_UPDATE_INTERVAL.as_secs(),
            },
            history: HistorySettings {
                switchover_age_secs: DEFAULT_SWITCHOVER_AGE_S as u64,
                low_res_interval_secs: DEFAULT_LOW_RES_INTERVAL_S as u64,
                low_res_max_age_secs: DEFAULT_LOW_RES_MAX_AGE_S as u64,
                auto_save_interval_secs: DEFAULT_AUTO_SAVE_INTERVAL.as_secs(),
            },
            logging: LoggingSettings {
                file: storage_dir.join(DEFAULT_LOG_FILE_NAME),
            },
            storage: StorageSettings {
                directory: storage_dir,
            },
        }
    }
}
