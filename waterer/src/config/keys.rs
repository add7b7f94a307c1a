//! Configuration key access and validation.
//!
//! This module provides a type-safe interface for getting and setting
//! configuration values by key name, with validation via the Specification Pattern.

use std::str::FromStr;
use thiserror::Error;

use super::defaults::MAX_NUM_CHANNELS;
use super::parser::{expand_tilde, parse_bool};
use super::settings::ConfigFile;
use super::writer::path_to_string;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
///
/// Each key maps to a specific field in [`ConfigFile`] and knows how to
/// get and set its value with proper validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Device settings
    DevicePort,
    DeviceBaudRate,
    DeviceHandshakeTimeoutSecs,
    DeviceRequestTimeoutSecs,
    DeviceFallback,

    // Controller settings
    ControllerNumChannels,
    ControllerStatusUpdateIntervalSecs,

    // History settings
    HistorySwitchoverAgeSecs,
    HistoryLowResIntervalSecs,
    HistoryLowResMaxAgeSecs,
    HistoryAutoSaveIntervalSecs,

    // Storage settings
    StorageDirectory,

    // Logging settings
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == lower)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "device.port").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::DevicePort => "device.port",
            ConfigKey::DeviceBaudRate => "device.baud_rate",
            ConfigKey::DeviceHandshakeTimeoutSecs => "device.handshake_timeout_secs",
            ConfigKey::DeviceRequestTimeoutSecs => "device.request_timeout_secs",
            ConfigKey::DeviceFallback => "device.fallback",
            ConfigKey::ControllerNumChannels => "controller.num_channels",
            ConfigKey::ControllerStatusUpdateIntervalSecs => {
                "controller.status_update_interval_secs"
            }
            ConfigKey::HistorySwitchoverAgeSecs => "history.switchover_age_secs",
            ConfigKey::HistoryLowResIntervalSecs => "history.low_res_interval_secs",
            ConfigKey::HistoryLowResMaxAgeSecs => "history.low_res_max_age_secs",
            ConfigKey::HistoryAutoSaveIntervalSecs => "history.auto_save_interval_secs",
            ConfigKey::StorageDirectory => "storage.directory",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "device").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "port").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::DevicePort => config.device.port.clone().unwrap_or_default(),
            ConfigKey::DeviceBaudRate => config.device.baud_rate.to_string(),
            ConfigKey::DeviceHandshakeTimeoutSecs => {
                config.device.handshake_timeout_secs.to_string()
            }
            ConfigKey::DeviceRequestTimeoutSecs => config.device.request_timeout_secs.to_string(),
            ConfigKey::DeviceFallback => config.device.fallback.to_string(),
            ConfigKey::ControllerNumChannels => config.controller.num_channels.to_string(),
            ConfigKey::ControllerStatusUpdateIntervalSecs => {
                config.controller.status_update_interval_secs.to_string()
            }
            ConfigKey::HistorySwitchoverAgeSecs => config.history.switchover_age_secs.to_string(),
            ConfigKey::HistoryLowResIntervalSecs => {
                config.history.low_res_interval_secs.to_string()
            }
            ConfigKey::HistoryLowResMaxAgeSecs => config.history.low_res_max_age_secs.to_string(),
            ConfigKey::HistoryAutoSaveIntervalSecs => {
                config.history.auto_save_interval_secs.to_string()
            }
            ConfigKey::StorageDirectory => path_to_string(&config.storage.directory),
            ConfigKey::LoggingFile => path_to_string(&config.logging.file),
        }
    }

    /// Set the value in a config file.
    ///
    /// Validates the value according to the key's specification before setting.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        self.validate(value)?;
        let value = value.trim();

        match self {
            ConfigKey::DevicePort => {
                config.device.port = (!value.is_empty()).then(|| value.to_string());
            }
            ConfigKey::DeviceBaudRate => config.device.baud_rate = self.parse(value)?,
            ConfigKey::DeviceHandshakeTimeoutSecs => {
                config.device.handshake_timeout_secs = self.parse(value)?;
            }
            ConfigKey::DeviceRequestTimeoutSecs => {
                config.device.request_timeout_secs = self.parse(value)?;
            }
            ConfigKey::DeviceFallback => config.device.fallback = parse_bool(value),
            ConfigKey::ControllerNumChannels => {
                config.controller.num_channels = self.parse(value)?;
            }
            ConfigKey::ControllerStatusUpdateIntervalSecs => {
                config.controller.status_update_interval_secs = self.parse(value)?;
            }
            ConfigKey::HistorySwitchoverAgeSecs => {
                config.history.switchover_age_secs = self.parse(value)?;
            }
            ConfigKey::HistoryLowResIntervalSecs => {
                config.history.low_res_interval_secs = self.parse(value)?;
            }
            ConfigKey::HistoryLowResMaxAgeSecs => {
                config.history.low_res_max_age_secs = self.parse(value)?;
            }
            ConfigKey::HistoryAutoSaveIntervalSecs => {
                config.history.auto_save_interval_secs = self.parse(value)?;
            }
            ConfigKey::StorageDirectory => config.storage.directory = expand_tilde(value),
            ConfigKey::LoggingFile => config.logging.file = expand_tilde(value),
        }
        Ok(())
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigKeyError> {
        value.parse().map_err(|_| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: "value out of range".to_string(),
        })
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value.trim())
            .map_err(|reason| ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason,
            })
    }

    /// Get the validation specification for this key.
    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::DevicePort => Box::new(AnyStringSpec),
            ConfigKey::DeviceBaudRate => Box::new(PositiveIntegerSpec),
            ConfigKey::DeviceHandshakeTimeoutSecs => Box::new(PositiveIntegerSpec),
            ConfigKey::DeviceRequestTimeoutSecs => Box::new(PositiveIntegerSpec),
            ConfigKey::DeviceFallback => Box::new(BooleanSpec),
            ConfigKey::ControllerNumChannels => {
                Box::new(RangeSpec::new(1, MAX_NUM_CHANNELS as u64))
            }
            ConfigKey::ControllerStatusUpdateIntervalSecs => Box::new(PositiveIntegerSpec),
            ConfigKey::HistorySwitchoverAgeSecs => Box::new(PositiveIntegerSpec),
            ConfigKey::HistoryLowResIntervalSecs => Box::new(PositiveIntegerSpec),
            ConfigKey::HistoryLowResMaxAgeSecs => Box::new(PositiveIntegerSpec),
            ConfigKey::HistoryAutoSaveIntervalSecs => Box::new(NonNegativeIntegerSpec),
            ConfigKey::StorageDirectory => Box::new(PathSpec),
            ConfigKey::LoggingFile => Box::new(PathSpec),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::DevicePort,
            ConfigKey::DeviceBaudRate,
            ConfigKey::DeviceHandshakeTimeoutSecs,
            ConfigKey::DeviceRequestTimeoutSecs,
            ConfigKey::DeviceFallback,
            ConfigKey::ControllerNumChannels,
            ConfigKey::ControllerStatusUpdateIntervalSecs,
            ConfigKey::HistorySwitchoverAgeSecs,
            ConfigKey::HistoryLowResIntervalSecs,
            ConfigKey::HistoryLowResMaxAgeSecs,
            ConfigKey::HistoryAutoSaveIntervalSecs,
            ConfigKey::StorageDirectory,
            ConfigKey::LoggingFile,
        ]
    }
}

// ============================================================================
// Value Specifications (Specification Pattern)
// ============================================================================

/// Trait for value validation specifications.
trait ValueSpecification {
    /// Check if the value satisfies this specification.
    /// Returns Ok(()) if valid, Err(reason) if invalid.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

/// Specification that accepts any string value.
struct AnyStringSpec;

impl ValueSpecification for AnyStringSpec {
    fn is_satisfied_by(&self, _value: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Specification for integers greater than zero.
struct PositiveIntegerSpec;

impl ValueSpecification for PositiveIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u32>() {
            Ok(n) if n > 0 => Ok(()),
            _ => Err("must be a positive integer".to_string()),
        }
    }
}

/// Specification for integers of zero or more.
struct NonNegativeIntegerSpec;

impl ValueSpecification for NonNegativeIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        value
            .parse::<u64>()
            .map(|_| ())
            .map_err(|_| "must be a non-negative integer (0 disables)".to_string())
    }
}

/// Specification for integers within an inclusive range.
struct RangeSpec {
    min: u64,
    max: u64,
}

impl RangeSpec {
    fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }
}

impl ValueSpecification for RangeSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u64>() {
            Ok(n) if (self.min..=self.max).contains(&n) => Ok(()),
            _ => Err(format!(
                "must be an integer between {} and {}",
                self.min, self.max
            )),
        }
    }
}

/// Specification for boolean values.
struct BooleanSpec;

impl ValueSpecification for BooleanSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        let valid = ["true", "false", "yes", "no", "1", "0", "on", "off"];
        if valid.contains(&lower.as_str()) {
            Ok(())
        } else {
            Err("must be true/false, yes/no, 1/0, or on/off".to_string())
        }
    }
}

/// Specification for path values (non-empty).
struct PathSpec;

impl ValueSpecification for PathSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            Err("must be a valid path".to_string())
        } else {
            Ok(())
        }
    }
}
