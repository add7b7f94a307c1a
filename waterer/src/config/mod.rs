//! Configuration for Waterer.
//!
//! The user-facing configuration lives in `~/.waterer/config.ini` and is
//! loaded into a [`ConfigFile`]. Engine components take their own
//! structured configs, built from the file through the conversions below.
//!
//! # Example
//!
//! ```
//! use waterer::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let session = config.session_config();
//! let controller = config.controller_config();
//!
//! assert_eq!(session.baud_rate, 9600);
//! assert_eq!(controller.status_update_interval.as_secs(), 5);
//! ```

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    default_storage_dir, CONFIG_DIR_NAME, DEFAULT_LOG_FILE_NAME, DEFAULT_NUM_CHANNELS,
    MAX_NUM_CHANNELS,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    ConfigFile, ControllerSettings, DeviceSettings, HistorySettings, LoggingSettings,
    StorageSettings,
};

use std::time::Duration;

use crate::device::SessionConfig;
use crate::pump::ControllerConfig;
use crate::status_log::StatusLogConfig;

impl ConfigFile {
    /// Device session settings from the `[device]` section.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_handshake_timeout(Duration::from_secs(self.device.handshake_timeout_secs))
            .with_request_timeout(Duration::from_secs(self.device.request_timeout_secs))
            .with_baud_rate(self.device.baud_rate)
            .with_fallback(self.device.fallback)
    }

    /// Controller settings from the `[controller]` and `[history]` sections.
    pub fn controller_config(&self) -> ControllerConfig {
        let history = &self.history;
        let auto_save = (history.auto_save_interval_secs > 0)
            .then(|| Duration::from_secs(history.auto_save_interval_secs));

        ControllerConfig::default()
            .with_status_update_interval(Duration::from_secs(
                self.controller.status_update_interval_secs,
            ))
            .with_log(StatusLogConfig::new(
                history.switchover_age_secs as f64,
                history.low_res_interval_secs as f64,
                history.low_res_max_age_secs as f64,
            ))
            .with_auto_save_interval(auto_save)
    }
}
