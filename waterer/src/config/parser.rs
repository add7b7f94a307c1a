//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::defaults::MAX_NUM_CHANNELS;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [device] section
    if let Some(section) = ini.section(Some("device")) {
        if let Some(v) = section.get("port") {
            let v = v.trim();
            config.device.port = (!v.is_empty()).then(|| v.to_string());
        }
        if let Some(v) = get_parsed(section, "device", "baud_rate", "must be a positive integer")? {
            config.device.baud_rate = v;
        }
        if let Some(v) = get_parsed(
            section,
            "device",
            "handshake_timeout_secs",
            "must be a positive integer (seconds)",
        )? {
            config.device.handshake_timeout_secs = v;
        }
        if let Some(v) = get_parsed(
            section,
            "device",
            "request_timeout_secs",
            "must be a positive integer (seconds)",
        )? {
            config.device.request_timeout_secs = v;
        }
        if let Some(v) = section.get("fallback") {
            config.device.fallback = parse_bool(v);
        }
    }

    // [controller] section
    if let Some(section) = ini.section(Some("controller")) {
        if let Some(v) = section.get("num_channels") {
            config.controller.num_channels = v
                .trim()
                .parse()
                .ok()
                .filter(|n| (1..=MAX_NUM_CHANNELS).contains(n))
                .ok_or_else(|| ConfigFileError::InvalidValue {
                    section: "controller".to_string(),
                    key: "num_channels".to_string(),
                    value: v.to_string(),
                    reason: format!("must be an integer between 1 and {}", MAX_NUM_CHANNELS),
                })?;
        }
        if let Some(v) = get_positive(section, "controller", "status_update_interval_secs")? {
            config.controller.status_update_interval_secs = v;
        }
    }

    // [history] section
    if let Some(section) = ini.section(Some("history")) {
        if let Some(v) = get_positive(section, "history", "switchover_age_secs")? {
            config.history.switchover_age_secs = v;
        }
        if let Some(v) = get_positive(section, "history", "low_res_interval_secs")? {
            config.history.low_res_interval_secs = v;
        }
        if let Some(v) = get_positive(section, "history", "low_res_max_age_secs")? {
            config.history.low_res_max_age_secs = v;
        }
        if let Some(v) = get_parsed(
            section,
            "history",
            "auto_save_interval_secs",
            "must be a non-negative integer (seconds, 0 disables)",
        )? {
            config.history.auto_save_interval_secs = v;
        }
    }

    // [storage] section
    if let Some(section) = ini.section(Some("storage")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.storage.directory = expand_tilde(v);
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Parse `section.key` if present.
fn get_parsed<T: FromStr>(
    properties: &Properties,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    properties
        .get(key)
        .map(|v| {
            v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                section: section.to_string(),
                key: key.to_string(),
                value: v.to_string(),
                reason: reason.to_string(),
            })
        })
        .transpose()
}

/// Parse a strictly positive number of seconds.
fn get_positive(
    properties: &Properties,
    section: &str,
    key: &str,
) -> Result<Option<u64>, ConfigFileError> {
    const REASON: &str = "must be a positive integer (seconds)";
    match get_parsed::<u64>(properties, section, key, REASON)? {
        Some(0) => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: "0".to_string(),
            reason: REASON.to_string(),
        }),
        other => Ok(other),
    }
}

/// Parse a boolean value from string.
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
