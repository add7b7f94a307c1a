//! Waterer - Moisture-feedback irrigation control
//!
//! This library drives a microcontroller with several pump channels, each
//! paired with a soil-moisture sensor. For each channel it polls status on
//! a fixed cadence, keeps a tiered history, and runs the pump when smoothed
//! humidity drops below a setpoint.
//!
//! # High-Level API
//!
//! For most use cases, the [`pump::PumpManager`] is the entry point:
//!
//! ```ignore
//! use std::sync::Arc;
//! use waterer::config::ConfigFile;
//! use waterer::device::{DeviceSession, SerialConnector};
//! use waterer::persistence::JsonFileStore;
//! use waterer::pump::PumpManager;
//!
//! let config = ConfigFile::load()?;
//! let session = Arc::new(DeviceSession::new(
//!     config.session_config(),
//!     Arc::new(SerialConnector::new(config.device.port.clone())),
//! ));
//! session.connect().await?;
//!
//! let manager = PumpManager::builder(session, config.controller.num_channels)
//!     .config(config.controller_config())
//!     .store(Arc::new(JsonFileStore::new(&config.storage.directory)))
//!     .build()?;
//! manager.start();
//! ```

pub mod config;
pub mod device;
pub mod logging;
pub mod persistence;
pub mod pump;
pub mod status_log;
pub mod time;

/// Version of the Waterer library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
