//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Serial link to the pump controller
    pub device: DeviceSettings,
    /// Channel count and polling cadence
    pub controller: ControllerSettings,
    /// Status log retention and auto-save
    pub history: HistorySettings,
    /// Settings and history files
    pub storage: StorageSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Device link configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSettings {
    /// Serial port path. `None` picks the first USB serial port.
    pub port: Option<String>,
    /// Serial baud rate
    pub baud_rate: u32,
    /// Seconds to wait for the ready line after opening the port
    pub handshake_timeout_secs: u64,
    /// Seconds to wait for each response
    pub request_timeout_secs: u64,
    /// Synthesize readings when no device responds
    pub fallback: bool,
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    /// Number of pump channels on the device
    pub num_channels: u32,
    /// Seconds between status polls
    pub status_update_interval_secs: u64,
}

/// History retention configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySettings {
    /// Age in seconds after which samples are thinned
    pub switchover_age_secs: u64,
    /// Minimum spacing in seconds of thinned samples
    pub low_res_interval_secs: u64,
    /// Age in seconds after which samples are discarded
    pub low_res_max_age_secs: u64,
    /// Seconds between automatic history saves (0 disables)
    pub auto_save_interval_secs: u64,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    /// Directory holding settings.json and history files
    pub directory: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
