//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let port = config.device.port.as_deref().unwrap_or("");

    format!(
        r#"[device]
; Serial port of the pump controller (e.g., /dev/ttyACM0 or COM3)
; If empty, the first USB serial port found is used
port = {}
; Serial baud rate (default: 9600)
baud_rate = {}
; Seconds to wait for the controller's ready line after opening the port (default: 5)
handshake_timeout_secs = {}
; Seconds to wait for each response (default: 5)
request_timeout_secs = {}
; Synthesize sensor readings when no controller responds (default: false)
; Useful for trying the software without hardware attached
fallback = {}

[controller]
; Number of pump channels on the controller (default: 6)
num_channels = {}
; Seconds between status polls of each channel (default: 5)
status_update_interval_secs = {}

[history]
; Samples older than this are thinned to one per low_res_interval_secs (default: 3600)
switchover_age_secs = {}
; Minimum spacing of thinned samples in seconds (default: 300)
low_res_interval_secs = {}
; Samples older than this are discarded (default: 604800, one week)
low_res_max_age_secs = {}
; Seconds between automatic history saves, 0 disables (default: 3600)
auto_save_interval_secs = {}

[storage]
; Directory for settings.json and history_<channel>.json (default: ~/.waterer)
directory = {}

[logging]
; Log file path (default: ~/.waterer/waterer.log)
file = {}
"#,
        port,
        config.device.baud_rate,
        config.device.handshake_timeout_secs,
        config.device.request_timeout_secs,
        config.device.fallback,
        config.controller.num_channels,
        config.controller.status_update_interval_secs,
        config.history.switchover_age_secs,
        config.history.low_res_interval_secs,
        config.history.low_res_max_age_secs,
        config.history.auto_save_interval_secs,
        path_to_string(&config.storage.directory),
        path_to_string(&config.logging.file),
    )
}

/// Convert path to string, collapsing home dir to ~.
pub(super) fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
