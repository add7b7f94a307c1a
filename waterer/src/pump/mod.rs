//! Moisture-feedback pump control.
//!
//! - [`SmartPumpSettings`] - validated per-channel calibration and feedback settings
//! - [`SmartPumpController`] - one channel's status loop and feedback decisions
//! - [`PumpManager`] - all channels on one device, plus persistence
//!
//! Humidity is derived linearly from sensor voltage: the dry reference maps
//! to 0 % and the wet reference to 100 %. Values outside the references
//! are reported as-is, below 0 % or above 100 %.

mod controller;
mod error;
mod manager;
mod settings;
mod status;

pub use controller::{
    ControllerConfig, SmartPumpController, DEFAULT_AUTO_SAVE_INTERVAL,
    DEFAULT_STATUS_UPDATE_INTERVAL,
};
pub use error::{ControllerError, ManagerError, ValidationError};
pub use manager::{PumpManager, PumpManagerBuilder};
pub use settings::{SettingsBuilder, SmartPumpSettings};
pub use status::{HistoryRecord, SmartPumpStatus, StatusHistory};
