//! Pump manager: owns every channel controller on one device.
//!
//! The manager is the boundary used by front ends. It validates channel
//! indices, fans lifecycle calls out to all controllers, and routes
//! settings and history through the configured stores.
//!
//! # Usage
//!
//! ```ignore
//! let manager = PumpManager::builder(session, 6)
//!     .config(ControllerConfig::default())
//!     .store(Arc::new(JsonFileStore::new(dir)))
//!     .build()?;
//!
//! manager.start();
//! let status = manager.get_status(2).await?;
//! manager.interrupt().await;
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use super::controller::{ControllerConfig, SmartPumpController};
use super::error::{ManagerError, ValidationError};
use super::settings::SmartPumpSettings;
use super::status::{HistoryRecord, SmartPumpStatus, StatusHistory};
use crate::device::SharedSession;
use crate::persistence::{HistoryStore, PersistenceError, SettingsStore};

/// Builder for [`PumpManager`].
pub struct PumpManagerBuilder {
    session: SharedSession,
    num_channels: u32,
    config: ControllerConfig,
    settings_store: Option<Arc<dyn SettingsStore>>,
    history_store: Option<Arc<dyn HistoryStore>>,
}

impl PumpManagerBuilder {
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn history_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history_store = Some(store);
        self
    }

    /// Use one store for both settings and history.
    pub fn store<S>(self, store: Arc<S>) -> Self
    where
        S: SettingsStore + HistoryStore + 'static,
    {
        self.settings_store(store.clone()).history_store(store)
    }

    /// Create the controllers, restoring saved settings and history.
    ///
    /// Channels without saved settings get defaults. Saved history that
    /// fails to load is logged and skipped; saved settings that fail
    /// validation are an error.
    pub fn build(self) -> Result<PumpManager, ManagerError> {
        let mut saved = match &self.settings_store {
            Some(store) => store.load_settings()?.unwrap_or_default(),
            None => Vec::new(),
        };
        if saved.len() > self.num_channels as usize {
            warn!(
                saved = saved.len(),
                num_channels = self.num_channels,
                "Ignoring saved settings for channels beyond the configured count"
            );
        }
        saved.resize_with(self.num_channels as usize, SmartPumpSettings::default);

        let mut controllers = Vec::with_capacity(saved.len());
        for (channel, settings) in (0..self.num_channels).zip(saved) {
            let controller = match &self.history_store {
                Some(store) => SmartPumpController::with_history_store(
                    channel,
                    Arc::clone(&self.session),
                    settings,
                    self.config.clone(),
                    Arc::clone(store),
                ),
                None => SmartPumpController::new(
                    channel,
                    Arc::clone(&self.session),
                    settings,
                    self.config.clone(),
                ),
            };

            if let Some(store) = &self.history_store {
                match store.load_history(channel) {
                    Ok(Some(record)) => {
                        if let Err(e) = controller.import_history(record) {
                            warn!(channel, error = %e, "Discarding invalid saved history");
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(channel, error = %e, "Failed to load saved history"),
                }
            }
            controllers.push(controller);
        }

        info!(num_channels = self.num_channels, "Pump manager created");
        Ok(PumpManager {
            controllers,
            settings_store: self.settings_store,
            history_store: self.history_store,
        })
    }
}

/// Owner of all channel controllers.
pub struct PumpManager {
    controllers: Vec<SmartPumpController>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    history_store: Option<Arc<dyn HistoryStore>>,
}

impl PumpManager {
    pub fn builder(session: SharedSession, num_channels: u32) -> PumpManagerBuilder {
        PumpManagerBuilder {
            session,
            num_channels,
            config: ControllerConfig::default(),
            settings_store: None,
            history_store: None,
        }
    }

    pub fn num_channels(&self) -> u32 {
        self.controllers.len() as u32
    }

    /// The controller for `channel`, or `ChannelOutOfRange`.
    pub fn check_channel(&self, channel: u32) -> Result<&SmartPumpController, ValidationError> {
        self.controllers
            .get(channel as usize)
            .ok_or(ValidationError::ChannelOutOfRange {
                channel,
                num_channels: self.num_channels(),
            })
    }

    /// Start every channel's control loop.
    pub fn start(&self) {
        for controller in &self.controllers {
            controller.start();
        }
        info!(num_channels = self.num_channels(), "All control loops started");
    }

    /// Stop every control loop, wait for them, then save history.
    pub async fn interrupt(&self) {
        for controller in &self.controllers {
            controller.interrupt();
        }
        for controller in &self.controllers {
            controller.join().await;
        }
        info!("All control loops stopped");

        let Some(store) = self.history_store.clone() else {
            return;
        };
        let records = self.export_histories();
        match tokio::task::spawn_blocking(move || write_histories(store.as_ref(), &records)).await {
            Ok(Ok(paths)) => info!(files = paths.len(), "History saved"),
            Ok(Err(e)) => warn!(error = %e, "Failed to save history on shutdown"),
            Err(e) => warn!(error = %e, "History save task failed"),
        }
    }

    pub async fn turn_on(&self, channel: u32) -> Result<(), ManagerError> {
        self.check_channel(channel)?.turn_on().await?;
        Ok(())
    }

    pub async fn turn_off(&self, channel: u32) -> Result<(), ManagerError> {
        self.check_channel(channel)?.turn_off().await?;
        Ok(())
    }

    pub fn get_settings(&self, channel: u32) -> Result<SmartPumpSettings, ManagerError> {
        Ok(self.check_channel(channel)?.settings())
    }

    /// Apply new settings to `channel` and save all settings if a store is set.
    pub fn set_settings(
        &self,
        channel: u32,
        settings: SmartPumpSettings,
    ) -> Result<(), ManagerError> {
        self.check_channel(channel)?.set_settings(settings);
        if self.settings_store.is_some() {
            self.save_settings()?;
        }
        Ok(())
    }

    /// Fresh status of `channel`. Always polls the device.
    pub async fn get_status(&self, channel: u32) -> Result<SmartPumpStatus, ManagerError> {
        Ok(self.check_channel(channel)?.status().await?)
    }

    /// Last logged status of `channel`, without polling.
    pub fn last_status(&self, channel: u32) -> Result<Option<SmartPumpStatus>, ManagerError> {
        Ok(self.check_channel(channel)?.last_status())
    }

    pub fn get_status_since(
        &self,
        channel: u32,
        earliest_epoch_time_s: Option<f64>,
    ) -> Result<StatusHistory, ManagerError> {
        Ok(self
            .check_channel(channel)?
            .get_status_since(earliest_epoch_time_s))
    }

    pub fn clear_status_logs(&self, channel: u32) -> Result<(), ManagerError> {
        self.check_channel(channel)?.clear_status_logs();
        Ok(())
    }

    pub async fn calibrate_dry(&self, channel: u32) -> Result<SmartPumpSettings, ManagerError> {
        let settings = self.check_channel(channel)?.calibrate_dry().await?;
        if self.settings_store.is_some() {
            self.save_settings()?;
        }
        Ok(settings)
    }

    pub async fn calibrate_wet(&self, channel: u32) -> Result<SmartPumpSettings, ManagerError> {
        let settings = self.check_channel(channel)?.calibrate_wet().await?;
        if self.settings_store.is_some() {
            self.save_settings()?;
        }
        Ok(settings)
    }

    /// Save all channels' settings. Returns the location written.
    pub fn save_settings(&self) -> Result<PathBuf, ManagerError> {
        let store = self
            .settings_store
            .as_ref()
            .ok_or(ManagerError::StoreNotConfigured("settings"))?;
        let settings: Vec<SmartPumpSettings> =
            self.controllers.iter().map(|c| c.settings()).collect();
        let path = store.save_settings(&settings)?;
        info!(path = %path.display(), "Settings saved");
        Ok(path)
    }

    /// Save every channel's history. Returns the locations written.
    pub fn save_history(&self) -> Result<Vec<PathBuf>, ManagerError> {
        let store = self
            .history_store
            .as_ref()
            .ok_or(ManagerError::StoreNotConfigured("history"))?;
        Ok(write_histories(store.as_ref(), &self.export_histories())?)
    }

    fn export_histories(&self) -> Vec<(u32, HistoryRecord)> {
        self.controllers
            .iter()
            .map(|c| (c.channel(), c.export_history()))
            .collect()
    }
}

fn write_histories(
    store: &dyn HistoryStore,
    records: &[(u32, HistoryRecord)],
) -> Result<Vec<PathBuf>, PersistenceError> {
    records
        .iter()
        .map(|(channel, record)| store.save_history(*channel, record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceSession, SessionConfig, SerialConnector};
    use crate::persistence::JsonFileStore;
    use tempfile::TempDir;

    /// Session that never connects; fallback makes every request succeed.
    fn fallback_session() -> SharedSession {
        Arc::new(DeviceSession::new(
            SessionConfig::default().with_fallback(true),
            Arc::new(SerialConnector::new(Some("/nonexistent".to_string()))),
        ))
    }

    #[test]
    fn test_channel_out_of_range() {
        let manager = PumpManager::builder(fallback_session(), 3).build().unwrap();
        assert_eq!(manager.num_channels(), 3);
        assert!(manager.check_channel(2).is_ok());

        match manager.get_settings(3) {
            Err(ManagerError::Validation(ValidationError::ChannelOutOfRange {
                channel,
                num_channels,
            })) => {
                assert_eq!(channel, 3);
                assert_eq!(num_channels, 3);
            }
            other => panic!("expected ChannelOutOfRange, got {:?}", other),
        }
        assert!(manager.clear_status_logs(10).is_err());
        assert!(manager.get_status_since(3, None).is_err());
    }

    #[tokio::test]
    async fn test_async_operations_check_channel() {
        let manager = PumpManager::builder(fallback_session(), 2).build().unwrap();
        assert!(matches!(
            manager.turn_on(2).await,
            Err(ManagerError::Validation(_))
        ));
        assert!(matches!(
            manager.get_status(5).await,
            Err(ManagerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_status_with_fallback_session() {
        let manager = PumpManager::builder(fallback_session(), 2).build().unwrap();
        let status = manager.get_status(1).await.unwrap();
        assert!(!status.pump_running);
        assert!(status.synthetic);
        assert!(manager.last_status(1).unwrap().unwrap().synthetic);
        assert!(manager.last_status(0).unwrap().is_none());
        manager.turn_on(0).await.unwrap();
    }

    #[test]
    fn test_save_without_store_fails() {
        let manager = PumpManager::builder(fallback_session(), 1).build().unwrap();
        assert!(matches!(
            manager.save_settings(),
            Err(ManagerError::StoreNotConfigured("settings"))
        ));
        assert!(matches!(
            manager.save_history(),
            Err(ManagerError::StoreNotConfigured("history"))
        ));
    }

    #[tokio::test]
    async fn test_settings_and_history_persist() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(JsonFileStore::new(temp_dir.path()));

        let manager = PumpManager::builder(fallback_session(), 2)
            .store(Arc::clone(&store))
            .build()
            .unwrap();
        let settings = SmartPumpSettings::builder()
            .with_name("chillies")
            .with_feedback_setpoint_pct(35.0)
            .build()
            .unwrap();
        manager.set_settings(1, settings.clone()).unwrap();
        manager.get_status(0).await.unwrap();
        manager.get_status(0).await.unwrap();
        let history = manager.get_status_since(0, None).unwrap();

        let paths = manager.save_history().unwrap();
        assert_eq!(paths.len(), 2);

        let restored = PumpManager::builder(fallback_session(), 2)
            .store(store)
            .build()
            .unwrap();
        assert_eq!(restored.get_settings(1).unwrap(), settings);
        assert_eq!(restored.get_settings(0).unwrap(), SmartPumpSettings::default());
        assert_eq!(restored.get_status_since(0, None).unwrap(), history);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_interrupt_all() {
        let manager = PumpManager::builder(fallback_session(), 3).build().unwrap();
        manager.start();
        tokio::time::sleep(std::time::Duration::from_secs(11)).await;
        manager.interrupt().await;

        for channel in 0..3 {
            assert!(!manager.check_channel(channel).unwrap().is_running());
            assert!(!manager
                .get_status_since(channel, None)
                .unwrap()
                .raw_voltage
                .is_empty());
        }
    }
    #[tokio::test]
    async fn test_interrupt_saves_history() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(JsonFileStore::new(temp_dir.path()));
        let manager = PumpManager::builder(fallback_session(), 2)
            .store(Arc::clone(&store))
            .build()
            .unwrap();
        manager.get_status(1).await.unwrap();

        manager.interrupt().await;

        let saved = store.load_history(1).unwrap().unwrap();
        assert_eq!(saved, manager.check_channel(1).unwrap().export_history());
        assert!(store.load_history(0).unwrap().unwrap().raw_voltage_times.is_empty());
    }
}
