//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization, the async runtime,
//! and device/manager construction to reduce duplication across command
//! handlers.

use std::future::Future;
use std::sync::Arc;

use tracing::info;
use waterer::config::ConfigFile;
use waterer::device::{DeviceSession, SerialConnector, SharedSession};
use waterer::logging::{default_log_file, init_logging, LoggingGuard};
use waterer::persistence::JsonFileStore;
use waterer::pump::PumpManager;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    runtime: tokio::runtime::Runtime,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `stdout_enabled` - Mirror log events to stdout as well as the log file
    pub fn new(stdout_enabled: bool) -> Result<Self, CliError> {
        // Load config file (or use defaults if not present)
        let config = ConfigFile::load()?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| ".".into());
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| default_log_file().to_string());

        let logging_guard = init_logging(&log_dir, &log_file, stdout_enabled)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)?;

        Ok(Self {
            logging_guard,
            config,
            runtime,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Waterer v{}", waterer::VERSION);
        info!("Waterer CLI: {} command", command);
    }

    /// Run a future to completion on the runner's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Open the device session described by `config`.
    pub async fn connect(&self, config: &ConfigFile) -> Result<SharedSession, CliError> {
        let connector = Arc::new(SerialConnector::new(config.device.port.clone()));
        let session = Arc::new(DeviceSession::new(config.session_config(), connector));
        session.connect().await?;

        if session.is_synthetic() {
            println!("No pump controller found, using synthetic readings");
        }
        Ok(session)
    }

    /// Create a pump manager backed by the configured storage directory.
    pub fn create_manager(
        &self,
        session: SharedSession,
        config: &ConfigFile,
    ) -> Result<PumpManager, CliError> {
        info!(
            storage = %config.storage.directory.display(),
            "Using storage directory"
        );
        let store = Arc::new(JsonFileStore::new(&config.storage.directory));
        let manager = PumpManager::builder(session, config.controller.num_channels)
            .config(config.controller_config())
            .store(store)
            .build()?;
        Ok(manager)
    }
}
