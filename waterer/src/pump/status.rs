//! Status snapshots and history reports.

use serde::{Deserialize, Serialize};

use crate::status_log::StatusLogData;

/// One sample of a channel's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartPumpStatus {
    pub raw_voltage: f64,
    pub humidity_pct: f64,
    /// Absent while the pump runs, since readings are unreliable then.
    pub smoothed_humidity_pct: Option<f64>,
    pub pump_running: bool,
    pub epoch_time: f64,
    /// Values were synthesized by fallback mode, not read from the device.
    #[serde(default)]
    pub synthetic: bool,
}

/// Time series for one channel, as returned by `get_status_since`.
///
/// Sensor series are reported in percent using the channel's current
/// calibration. Voltages are included so a client can recalibrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistory {
    pub raw_voltage: StatusLogData<f64>,
    pub humidity_pct: StatusLogData<f64>,
    pub smoothed_humidity_pct: StatusLogData<Option<f64>>,
    pub pump_running: StatusLogData<bool>,
}

/// Lossless export of a channel's three logs.
///
/// Serialized as a flat record with one times/values pair per log.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub raw_voltage_times: Vec<f64>,
    pub raw_voltage_values: Vec<f64>,
    pub smoothed_voltage_times: Vec<f64>,
    pub smoothed_voltage_values: Vec<Option<f64>>,
    pub pump_running_times: Vec<f64>,
    pub pump_running_values: Vec<bool>,
}

impl HistoryRecord {
    pub fn from_logs(
        raw: StatusLogData<f64>,
        smoothed: StatusLogData<Option<f64>>,
        running: StatusLogData<bool>,
    ) -> Self {
        Self {
            raw_voltage_times: raw.times,
            raw_voltage_values: raw.values,
            smoothed_voltage_times: smoothed.times,
            smoothed_voltage_values: smoothed.values,
            pump_running_times: running.times,
            pump_running_values: running.values,
        }
    }

    #[allow(clippy::type_complexity)]
    pub fn into_logs(
        self,
    ) -> (
        StatusLogData<f64>,
        StatusLogData<Option<f64>>,
        StatusLogData<bool>,
    ) {
        (
            StatusLogData::new(self.raw_voltage_times, self.raw_voltage_values),
            StatusLogData::new(self.smoothed_voltage_times, self.smoothed_voltage_values),
            StatusLogData::new(self.pump_running_times, self.pump_running_values),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_record_is_flat() {
        let record = HistoryRecord::from_logs(
            StatusLogData::new(vec![1.0], vec![2.5]),
            StatusLogData::new(vec![1.0], vec![None]),
            StatusLogData::new(vec![1.0], vec![false]),
        );
        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 6);
        assert_eq!(value["raw_voltage_values"][0], 2.5);
        assert!(value["smoothed_voltage_values"][0].is_null());
        assert_eq!(value["pump_running_values"][0], false);
    }
}
