//! Common types and utilities shared across CLI commands.

use clap::Args;
use waterer::config::ConfigFile;
use waterer::pump::{PumpManager, SmartPumpStatus};

/// Device selection arguments shared by commands that talk to hardware.
#[derive(Debug, Clone, Default, Args)]
pub struct DeviceArgs {
    /// Serial port of the pump controller (overrides device.port)
    #[arg(long)]
    pub port: Option<String>,

    /// Use synthetic readings if no controller responds
    #[arg(long)]
    pub fallback: bool,
}

impl DeviceArgs {
    /// Overlay CLI arguments on the loaded config. CLI takes precedence.
    pub fn apply(&self, config: &mut ConfigFile) {
        if let Some(port) = &self.port {
            config.device.port = Some(port.clone());
        }
        if self.fallback {
            config.device.fallback = true;
        }
    }
}

/// Header line for [`format_status_row`].
pub fn status_header() -> String {
    format!(
        "{:<4} {:<16} {:>8} {:>9} {:>9} {:<5}",
        "CH", "NAME", "VOLTS", "HUMIDITY", "SMOOTHED", "PUMP"
    )
}

/// One table row for a channel's status.
pub fn format_status_row(channel: u32, name: &str, status: Option<&SmartPumpStatus>) -> String {
    let Some(status) = status else {
        return format!("{:<4} {:<16} {:>8}", channel, name, "-");
    };
    let smoothed = status
        .smoothed_humidity_pct
        .map(|pct| format!("{:.1}%", pct))
        .unwrap_or_else(|| "-".to_string());

    let row = format!(
        "{:<4} {:<16} {:>8.3} {:>9} {:>9} {:<5}",
        channel,
        name,
        status.raw_voltage,
        format!("{:.1}%", status.humidity_pct),
        smoothed,
        if status.pump_running { "on" } else { "off" }
    );
    if status.synthetic {
        format!("{} (synthetic)", row)
    } else {
        row
    }
}

/// Print the last logged status of every channel.
pub fn print_last_status(manager: &PumpManager) {
    println!("{}", status_header());
    for channel in 0..manager.num_channels() {
        let name = manager
            .get_settings(channel)
            .map(|s| s.name().to_string())
            .unwrap_or_default();
        let status = manager.last_status(channel).ok().flatten();
        println!("{}", format_status_row(channel, &name, status.as_ref()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(pump_running: bool) -> SmartPumpStatus {
        SmartPumpStatus {
            raw_voltage: 1.25,
            humidity_pct: 37.88,
            smoothed_humidity_pct: (!pump_running).then_some(40.0),
            pump_running,
            epoch_time: 0.0,
            synthetic: false,
        }
    }

    #[test]
    fn test_device_args_override_config() {
        let mut config = ConfigFile::default();
        let args = DeviceArgs {
            port: Some("/dev/ttyACM3".to_string()),
            fallback: true,
        };
        args.apply(&mut config);
        assert_eq!(config.device.port.as_deref(), Some("/dev/ttyACM3"));
        assert!(config.device.fallback);
    }

    #[test]
    fn test_empty_device_args_keep_config() {
        let mut config = ConfigFile::default();
        config.device.port = Some("COM4".to_string());
        DeviceArgs::default().apply(&mut config);
        assert_eq!(config.device.port.as_deref(), Some("COM4"));
        assert!(!config.device.fallback);
    }

    #[test]
    fn test_status_row() {
        let row = format_status_row(2, "tomatoes", Some(&status(false)));
        assert!(row.starts_with("2    tomatoes"));
        assert!(row.contains("1.250"));
        assert!(row.contains("37.9%"));
        assert!(row.contains("40.0%"));
        assert!(row.ends_with("off  "));
    }

    #[test]
    fn test_status_row_while_running() {
        let row = format_status_row(0, "", Some(&status(true)));
        assert!(row.contains(" - "));
        assert!(row.contains("on"));
    }

    #[test]
    fn test_status_row_marks_synthetic() {
        let mut fake = status(false);
        fake.synthetic = true;
        let row = format_status_row(1, "lettuce", Some(&fake));
        assert!(row.ends_with("off   (synthetic)"));
        assert!(!format_status_row(1, "lettuce", Some(&status(false))).contains("synthetic"));
    }

    #[test]
    fn test_status_row_without_samples() {
        let row = format_status_row(5, "herbs", None);
        assert!(row.trim_end().ends_with('-'));
    }
}
