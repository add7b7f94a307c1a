//! Per-channel pump settings.
//!
//! # Sensor polarity
//!
//! A higher sensor voltage means wetter soil. The dry reference is the
//! voltage read in dry soil (0 %), the wet reference the voltage read in
//! saturated soil (100 %), and `dry_reference_v < wet_reference_v` is
//! enforced. Percentages outside 0-100 are possible when a reading falls
//! outside the calibrated range.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

pub const DEFAULT_DRY_REFERENCE_V: f64 = 0.0;
pub const DEFAULT_WET_REFERENCE_V: f64 = 3.3;
pub const DEFAULT_PUMP_ON_TIME_S: f64 = 2.0;
pub const DEFAULT_PUMP_UPDATE_TIME_S: f64 = 600.0;
pub const DEFAULT_FEEDBACK_SETPOINT_PCT: f64 = 50.0;
pub const DEFAULT_NUM_SMOOTHING_SAMPLES: u32 = 10;

/// Longest accepted feedback period (one week). Bounds `pump_on_time_s` too.
pub const MAX_PUMP_UPDATE_TIME_S: f64 = 7.0 * 24.0 * 3600.0;

/// Validated settings for one channel.
///
/// Construct through [`SmartPumpSettings::builder`] and change through
/// [`SmartPumpSettings::to_builder`]; both paths end in the same validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SettingsBuilder")]
pub struct SmartPumpSettings {
    dry_reference_v: f64,
    wet_reference_v: f64,
    pump_on_time_s: f64,
    pump_update_time_s: f64,
    feedback_active: bool,
    feedback_setpoint_pct: f64,
    num_smoothing_samples: u32,
    name: String,
}

impl SmartPumpSettings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Start a builder from the current values.
    pub fn to_builder(&self) -> SettingsBuilder {
        SettingsBuilder {
            dry_reference_v: self.dry_reference_v,
            wet_reference_v: self.wet_reference_v,
            pump_on_time_s: self.pump_on_time_s,
            pump_update_time_s: self.pump_update_time_s,
            feedback_active: self.feedback_active,
            feedback_setpoint_pct: self.feedback_setpoint_pct,
            num_smoothing_samples: self.num_smoothing_samples,
            name: self.name.clone(),
        }
    }

    pub fn dry_reference_v(&self) -> f64 {
        self.dry_reference_v
    }

    pub fn wet_reference_v(&self) -> f64 {
        self.wet_reference_v
    }

    pub fn pump_on_time_s(&self) -> f64 {
        self.pump_on_time_s
    }

    pub fn pump_update_time_s(&self) -> f64 {
        self.pump_update_time_s
    }

    pub fn feedback_active(&self) -> bool {
        self.feedback_active
    }

    pub fn feedback_setpoint_pct(&self) -> f64 {
        self.feedback_setpoint_pct
    }

    pub fn num_smoothing_samples(&self) -> u32 {
        self.num_smoothing_samples
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pump_on_time(&self) -> Duration {
        Duration::from_secs_f64(self.pump_on_time_s)
    }

    pub fn pump_update_time(&self) -> Duration {
        Duration::from_secs_f64(self.pump_update_time_s)
    }

    /// Exponential smoothing weight given to each new reading.
    pub fn smoothing_factor(&self) -> f64 {
        1.0 / f64::from(self.num_smoothing_samples)
    }

    /// Map a sensor voltage onto the calibrated 0-100 % scale.
    pub fn humidity_pct(&self, voltage: f64) -> f64 {
        (voltage - self.dry_reference_v) / (self.wet_reference_v - self.dry_reference_v) * 100.0
    }
}

impl Default for SmartPumpSettings {
    fn default() -> Self {
        Self {
            dry_reference_v: DEFAULT_DRY_REFERENCE_V,
            wet_reference_v: DEFAULT_WET_REFERENCE_V,
            pump_on_time_s: DEFAULT_PUMP_ON_TIME_S,
            pump_update_time_s: DEFAULT_PUMP_UPDATE_TIME_S,
            feedback_active: false,
            feedback_setpoint_pct: DEFAULT_FEEDBACK_SETPOINT_PCT,
            num_smoothing_samples: DEFAULT_NUM_SMOOTHING_SAMPLES,
            name: String::new(),
        }
    }
}

/// Unvalidated settings. Also the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsBuilder {
    pub dry_reference_v: f64,
    pub wet_reference_v: f64,
    pub pump_on_time_s: f64,
    pub pump_update_time_s: f64,
    pub feedback_active: bool,
    pub feedback_setpoint_pct: f64,
    pub num_smoothing_samples: u32,
    pub name: String,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        SmartPumpSettings::default().to_builder()
    }
}

impl SettingsBuilder {
    pub fn with_dry_reference_v(mut self, volts: f64) -> Self {
        self.dry_reference_v = volts;
        self
    }

    pub fn with_wet_reference_v(mut self, volts: f64) -> Self {
        self.wet_reference_v = volts;
        self
    }

    pub fn with_pump_on_time_s(mut self, seconds: f64) -> Self {
        self.pump_on_time_s = seconds;
        self
    }

    pub fn with_pump_update_time_s(mut self, seconds: f64) -> Self {
        self.pump_update_time_s = seconds;
        self
    }

    pub fn with_feedback_active(mut self, active: bool) -> Self {
        self.feedback_active = active;
        self
    }

    pub fn with_feedback_setpoint_pct(mut self, pct: f64) -> Self {
        self.feedback_setpoint_pct = pct;
        self
    }

    pub fn with_num_smoothing_samples(mut self, samples: u32) -> Self {
        self.num_smoothing_samples = samples;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Validate and produce settings.
    pub fn build(self) -> Result<SmartPumpSettings, ValidationError> {
        for (field, value) in [
            ("dry_reference_v", self.dry_reference_v),
            ("wet_reference_v", self.wet_reference_v),
            ("pump_on_time_s", self.pump_on_time_s),
            ("pump_update_time_s", self.pump_update_time_s),
            ("feedback_setpoint_pct", self.feedback_setpoint_pct),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::settings(field, "must be a finite number"));
            }
        }

        if self.wet_reference_v <= self.dry_reference_v {
            return Err(ValidationError::settings(
                "wet_reference_v",
                format!(
                    "({} V) must be greater than dry_reference_v ({} V)",
                    self.wet_reference_v, self.dry_reference_v
                ),
            ));
        }
        if self.pump_on_time_s < 0.0 {
            return Err(ValidationError::settings("pump_on_time_s", "must not be negative"));
        }
        if self.pump_update_time_s < 0.0 {
            return Err(ValidationError::settings(
                "pump_update_time_s",
                "must not be negative",
            ));
        }
        if self.pump_update_time_s > MAX_PUMP_UPDATE_TIME_S {
            return Err(ValidationError::settings(
                "pump_update_time_s",
                format!("must not exceed {} s", MAX_PUMP_UPDATE_TIME_S),
            ));
        }
        if self.pump_on_time_s > self.pump_update_time_s {
            return Err(ValidationError::settings(
                "pump_on_time_s",
                format!(
                    "({} s) must not exceed pump_update_time_s ({} s)",
                    self.pump_on_time_s, self.pump_update_time_s
                ),
            ));
        }
        if self.num_smoothing_samples <= 1 {
            return Err(ValidationError::settings(
                "num_smoothing_samples",
                "must be greater than 1",
            ));
        }

        Ok(SmartPumpSettings {
            dry_reference_v: self.dry_reference_v,
            wet_reference_v: self.wet_reference_v,
            pump_on_time_s: self.pump_on_time_s,
            pump_update_time_s: self.pump_update_time_s,
            feedback_active: self.feedback_active,
            feedback_setpoint_pct: self.feedback_setpoint_pct,
            num_smoothing_samples: self.num_smoothing_samples,
            name: self.name,
        })
    }
}

impl TryFrom<SettingsBuilder> for SmartPumpSettings {
    type Error = ValidationError;

    fn try_from(builder: SettingsBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}
