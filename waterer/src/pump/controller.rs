//! Smart pump controller: one channel's state and feedback loop.
//!
//! Each controller polls its sensor and pump state on a fixed cadence,
//! records every sample in three status logs, and on a slower cadence
//! decides whether to run the pump based on smoothed humidity.
//!
//! # Loop
//!
//! ```text
//! ┌─ wait (status interval | settings changed | cancelled) ─┐
//! │  poll get_voltage + get_state       (skip cycle on error) │
//! │  smooth, append raw/smoothed/running samples              │
//! │  if feedback due: re-read, compare to setpoint, turn_on   │
//! │  if auto-save due: save history                           │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let controller = SmartPumpController::new(0, session, settings, ControllerConfig::default());
//! controller.start();
//! let status = controller.status().await?;
//! controller.interrupt();
//! controller.join().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::{ControllerError, ValidationError};
use super::settings::SmartPumpSettings;
use super::status::{HistoryRecord, SmartPumpStatus, StatusHistory};
use crate::device::{SessionError, SharedSession};
use crate::persistence::HistoryStore;
use crate::status_log::{BinaryStatusLog, StatusLog, StatusLogConfig, StatusLogData};
use crate::time::EpochClock;

/// Default time between status polls.
pub const DEFAULT_STATUS_UPDATE_INTERVAL: Duration = Duration::from_secs(5);

/// Default time between automatic history saves.
pub const DEFAULT_AUTO_SAVE_INTERVAL: Duration = Duration::from_secs(3600);

/// Loop and retention settings shared by all channels.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Time between status polls.
    pub status_update_interval: Duration,

    /// Retention of the three status logs.
    pub log: StatusLogConfig,

    /// Save history this often when a history store is attached.
    /// `None` disables auto-save.
    pub auto_save_interval: Option<Duration>,
}

impl ControllerConfig {
    pub fn with_status_update_interval(mut self, interval: Duration) -> Self {
        self.status_update_interval = interval;
        self
    }

    pub fn with_log(mut self, log: StatusLogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn with_auto_save_interval(mut self, interval: Option<Duration>) -> Self {
        self.auto_save_interval = interval;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            status_update_interval: DEFAULT_STATUS_UPDATE_INTERVAL,
            log: StatusLogConfig::default(),
            auto_save_interval: Some(DEFAULT_AUTO_SAVE_INTERVAL),
        }
    }
}

/// State shared between the controller handle and its loop task.
struct Shared {
    channel: u32,
    session: SharedSession,
    config: ControllerConfig,
    clock: EpochClock,
    settings: RwLock<SmartPumpSettings>,
    settings_changed: Notify,
    raw_log: StatusLog<f64>,
    smoothed_log: StatusLog<Option<f64>>,
    running_log: BinaryStatusLog,
    /// Keeps poll + append atomic so samples stay time-ordered.
    poll_lock: Mutex<()>,
    history_store: Option<Arc<dyn HistoryStore>>,
}

struct LoopHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Controller for one irrigation channel.
pub struct SmartPumpController {
    shared: Arc<Shared>,
    running: parking_lot::Mutex<Option<LoopHandle>>,
}

impl SmartPumpController {
    pub fn new(
        channel: u32,
        session: SharedSession,
        settings: SmartPumpSettings,
        config: ControllerConfig,
    ) -> Self {
        Self::build(channel, session, settings, config, None)
    }

    /// Create a controller that saves its history to `store` while running.
    pub fn with_history_store(
        channel: u32,
        session: SharedSession,
        settings: SmartPumpSettings,
        config: ControllerConfig,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        Self::build(channel, session, settings, config, Some(store))
    }

    fn build(
        channel: u32,
        session: SharedSession,
        settings: SmartPumpSettings,
        config: ControllerConfig,
        history_store: Option<Arc<dyn HistoryStore>>,
    ) -> Self {
        let shared = Shared {
            channel,
            session,
            clock: EpochClock::new(),
            settings: RwLock::new(settings),
            settings_changed: Notify::new(),
            raw_log: StatusLog::new(config.log),
            smoothed_log: StatusLog::new(config.log),
            running_log: BinaryStatusLog::new(config.log.max_age_s),
            poll_lock: Mutex::new(()),
            history_store,
            config,
        };
        Self {
            shared: Arc::new(shared),
            running: parking_lot::Mutex::new(None),
        }
    }

    pub fn channel(&self) -> u32 {
        self.shared.channel
    }

    /// Spawn the control loop. Does nothing if it is already running.
    pub fn start(&self) {
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            debug!(channel = self.shared.channel, "Control loop already running");
            return;
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(Arc::clone(&self.shared).run(cancel.clone()));
        *running = Some(LoopHandle { cancel, task });
    }

    /// Whether the control loop task is alive.
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }

    /// Ask the control loop to stop. Returns immediately.
    pub fn interrupt(&self) {
        if let Some(running) = self.running.lock().as_ref() {
            info!(channel = self.shared.channel, "Interrupting control loop");
            running.cancel.cancel();
        }
    }

    /// Wait for the control loop to exit after [`interrupt`](Self::interrupt).
    ///
    /// Bounded by one request timeout plus one status interval; a loop that
    /// has not exited by then is aborted.
    pub async fn join(&self) {
        let handle = self.running.lock().take();
        let Some(LoopHandle { cancel, mut task }) = handle else {
            return;
        };
        cancel.cancel();

        let bound = self.shared.session.config().request_timeout
            + self.shared.config.status_update_interval;
        match tokio::time::timeout(bound, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(channel = self.shared.channel, error = %e, "Control loop task failed")
            }
            Err(_) => {
                warn!(
                    channel = self.shared.channel,
                    "Control loop did not stop within {:?}, aborting", bound
                );
                task.abort();
            }
        }
    }

    /// Poll the device now and return a fresh snapshot.
    ///
    /// The sample is also appended to the status logs. Concurrent callers
    /// and the control loop all share the device link, so each call costs
    /// two exchanges on it.
    pub async fn status(&self) -> Result<SmartPumpStatus, ControllerError> {
        Ok(self.shared.poll().await?)
    }

    /// Most recent logged sample, without touching the device.
    pub fn last_status(&self) -> Option<SmartPumpStatus> {
        self.shared.last_status()
    }

    pub fn settings(&self) -> SmartPumpSettings {
        self.shared.settings.read().clone()
    }

    /// Replace the settings and wake the control loop.
    pub fn set_settings(&self, settings: SmartPumpSettings) {
        *self.shared.settings.write() = settings;
        self.shared.settings_changed.notify_one();
        info!(channel = self.shared.channel, "Settings updated");
    }

    /// Run the pump for the configured on-time.
    pub async fn turn_on(&self) -> Result<(), ControllerError> {
        let duration = self.shared.settings.read().pump_on_time();
        info!(channel = self.shared.channel, ?duration, "Turning pump on");
        self.shared
            .session
            .turn_on(self.shared.channel, duration)
            .await?;
        Ok(())
    }

    pub async fn turn_off(&self) -> Result<(), ControllerError> {
        info!(channel = self.shared.channel, "Turning pump off");
        self.shared.session.turn_off(self.shared.channel).await?;
        Ok(())
    }

    /// Set the dry reference to the current sensor voltage.
    pub async fn calibrate_dry(&self) -> Result<SmartPumpSettings, ControllerError> {
        let volts = self.shared.session.get_voltage(self.shared.channel).await?;
        self.update_settings(|s| s.to_builder().with_dry_reference_v(volts).build())
    }

    /// Set the wet reference to the current sensor voltage.
    pub async fn calibrate_wet(&self) -> Result<SmartPumpSettings, ControllerError> {
        let volts = self.shared.session.get_voltage(self.shared.channel).await?;
        self.update_settings(|s| s.to_builder().with_wet_reference_v(volts).build())
    }

    fn update_settings<F>(&self, update: F) -> Result<SmartPumpSettings, ControllerError>
    where
        F: FnOnce(&SmartPumpSettings) -> Result<SmartPumpSettings, ValidationError>,
    {
        let updated = {
            let mut settings = self.shared.settings.write();
            let updated = update(&*settings)?;
            *settings = updated.clone();
            updated
        };
        self.shared.settings_changed.notify_one();
        info!(channel = self.shared.channel, "Settings recalibrated");
        Ok(updated)
    }

    /// Logged samples at or after `min_time` (epoch seconds).
    pub fn get_status_since(&self, min_time: Option<f64>) -> StatusHistory {
        let settings = self.settings();
        let (raw_times, raw_values) = self.shared.raw_log.get_values(min_time);
        let (smoothed_times, smoothed_values) = self.shared.smoothed_log.get_values(min_time);
        let (running_times, running_values) = self.shared.running_log.get_values(min_time);

        let humidity = raw_values.iter().map(|v| settings.humidity_pct(*v)).collect();
        let smoothed = smoothed_values
            .iter()
            .map(|v| v.map(|v| settings.humidity_pct(v)))
            .collect();

        StatusHistory {
            humidity_pct: StatusLogData::new(raw_times.clone(), humidity),
            raw_voltage: StatusLogData::new(raw_times, raw_values),
            smoothed_humidity_pct: StatusLogData::new(smoothed_times, smoothed),
            pump_running: StatusLogData::new(running_times, running_values),
        }
    }

    pub fn clear_status_logs(&self) {
        self.shared.raw_log.clear();
        self.shared.smoothed_log.clear();
        self.shared.running_log.clear();
        info!(channel = self.shared.channel, "Status logs cleared");
    }

    pub fn export_history(&self) -> HistoryRecord {
        self.shared.export_history()
    }

    /// Replace all three logs with `record`.
    ///
    /// The record is validated as a whole before any log is touched. Fails
    /// with [`ControllerError::PollInProgress`] while a poll holds the logs.
    pub fn import_history(&self, record: HistoryRecord) -> Result<(), ControllerError> {
        let _poll = self
            .shared
            .poll_lock
            .try_lock()
            .map_err(|_| ControllerError::PollInProgress(self.shared.channel))?;

        let (raw, smoothed, running) = record.into_logs();
        raw.validate()?;
        smoothed.validate()?;
        running.validate()?;

        self.shared.raw_log.load_data(raw)?;
        self.shared.smoothed_log.load_data(smoothed)?;
        self.shared.running_log.load_data(running)?;
        Ok(())
    }
}

impl Drop for SmartPumpController {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.cancel.cancel();
        }
    }
}

impl Shared {
    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(
            channel = self.channel,
            interval = ?self.config.status_update_interval,
            "Control loop started"
        );

        let mut last_feedback = Instant::now();
        let mut last_save = Instant::now();

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,
                _ = self.settings_changed.notified() => {
                    debug!(channel = self.channel, "Woken by settings change");
                }
                _ = tokio::time::sleep(self.config.status_update_interval) => {}
            }

            let cycle = self.cycle(&mut last_feedback, &mut last_save);
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,
                _ = cycle => {}
            }
        }

        info!(channel = self.channel, "Control loop finished");
    }

    async fn cycle(&self, last_feedback: &mut Instant, last_save: &mut Instant) {
        if let Err(e) = self.poll().await {
            if e.is_transient() {
                warn!(channel = self.channel, error = %e, "Status poll failed, skipping cycle");
            } else {
                error!(channel = self.channel, error = %e, "Bad reply from device, skipping cycle");
            }
            return;
        }

        self.feedback(last_feedback).await;

        if let (Some(interval), Some(store)) = (self.config.auto_save_interval, &self.history_store)
        {
            if last_save.elapsed() >= interval {
                *last_save = Instant::now();
                self.save_history(Arc::clone(store)).await;
            }
        }
    }

    /// Read voltage and pump state, then log the sample.
    async fn poll(&self) -> Result<SmartPumpStatus, SessionError> {
        let _poll = self.poll_lock.lock().await;

        let raw_voltage = self.session.get_voltage(self.channel).await?;
        let pump_running = self.session.get_state(self.channel).await?;

        let settings = self.settings.read().clone();
        let smoothed = self.smooth(raw_voltage, pump_running, settings.smoothing_factor());

        let epoch_time = self.clock.now_after(self.newest_sample_time());
        self.raw_log.add_sample(epoch_time, raw_voltage);
        self.smoothed_log.add_sample(epoch_time, smoothed);
        self.running_log.add_sample(epoch_time, pump_running);

        Ok(SmartPumpStatus {
            raw_voltage,
            humidity_pct: settings.humidity_pct(raw_voltage),
            smoothed_humidity_pct: smoothed.map(|v| settings.humidity_pct(v)),
            pump_running,
            epoch_time,
            synthetic: self.session.is_synthetic(),
        })
    }

    /// Exponentially smoothed voltage, or `None` while the pump runs.
    ///
    /// After a gap (no previous sample, or the pump just stopped) the raw
    /// reading restarts the average.
    fn smooth(&self, raw_voltage: f64, pump_running: bool, factor: f64) -> Option<f64> {
        if pump_running {
            return None;
        }
        match self.smoothed_log.get_newest_value() {
            Some((_, Some(previous))) => Some(previous + factor * (raw_voltage - previous)),
            _ => Some(raw_voltage),
        }
    }

    fn newest_sample_time(&self) -> Option<f64> {
        [
            self.raw_log.get_newest_value().map(|(t, _)| t),
            self.smoothed_log.get_newest_value().map(|(t, _)| t),
            self.running_log.get_newest_value().map(|(t, _)| t),
        ]
        .into_iter()
        .flatten()
        .reduce(f64::max)
    }

    async fn feedback(&self, last_feedback: &mut Instant) {
        let settings = self.settings.read().clone();
        if !settings.feedback_active() || last_feedback.elapsed() < settings.pump_update_time() {
            return;
        }
        // Updated before acting so a failing device is not retried every cycle.
        *last_feedback = Instant::now();

        let humidity_pct = match self.session.get_voltage(self.channel).await {
            Ok(volts) => settings.humidity_pct(volts),
            Err(e) => {
                warn!(channel = self.channel, error = %e, "Failed to read humidity for feedback");
                return;
            }
        };

        let Some((_, Some(smoothed_v))) = self.smoothed_log.get_newest_value() else {
            debug!(
                channel = self.channel,
                "No smoothed reading while pump runs, skipping feedback"
            );
            return;
        };
        let smoothed_pct = settings.humidity_pct(smoothed_v);

        info!(
            channel = self.channel,
            humidity_pct,
            smoothed_pct,
            setpoint_pct = settings.feedback_setpoint_pct(),
            "Feedback check"
        );

        if smoothed_pct < settings.feedback_setpoint_pct() {
            let duration = settings.pump_on_time();
            info!(channel = self.channel, ?duration, "Activating pump");
            if let Err(e) = self.session.turn_on(self.channel, duration).await {
                warn!(channel = self.channel, error = %e, "Failed to activate pump");
            }
        }
    }

    fn last_status(&self) -> Option<SmartPumpStatus> {
        let (epoch_time, raw_voltage) = self.raw_log.get_newest_value()?;
        let smoothed = self.smoothed_log.get_newest_value().and_then(|(_, v)| v);
        let pump_running = self
            .running_log
            .get_newest_value()
            .map(|(_, running)| running)
            .unwrap_or(false);
        let settings = self.settings.read();

        Some(SmartPumpStatus {
            raw_voltage,
            humidity_pct: settings.humidity_pct(raw_voltage),
            smoothed_humidity_pct: smoothed.map(|v| settings.humidity_pct(v)),
            pump_running,
            epoch_time,
            synthetic: self.session.is_synthetic(),
        })
    }

    fn export_history(&self) -> HistoryRecord {
        HistoryRecord::from_logs(
            self.raw_log.to_data(),
            self.smoothed_log.to_data(),
            self.running_log.to_data(),
        )
    }

    async fn save_history(&self, store: Arc<dyn HistoryStore>) {
        let channel = self.channel;
        let record = self.export_history();
        match tokio::task::spawn_blocking(move || store.save_history(channel, &record)).await {
            Ok(Ok(path)) => debug!(channel, path = %path.display(), "History auto-saved"),
            Ok(Err(e)) => warn!(channel, error = %e, "History auto-save failed"),
            Err(e) => warn!(channel, error = %e, "History auto-save task failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceSession, SessionConfig, StreamConnector};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    /// Fake firmware: fixed voltage, counts turn_on requests.
    fn spawn_device(volts: f64, running: bool, turn_ons: Arc<AtomicUsize>) -> SharedSession {
        let (local, remote) = tokio::io::duplex(4096);
        tokio::spawn(async move {
            let (read, mut write) = tokio::io::split(remote);
            write.write_all(b"Arduino ready\n").await.unwrap();
            let mut lines = BufReader::new(read).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let req: serde_json::Value = serde_json::from_str(&line).unwrap();
                let data = match req["instruction"].as_str().unwrap() {
                    "get_voltage" => volts,
                    "get_state" => f64::from(u8::from(running)),
                    "turn_on" => {
                        turn_ons.fetch_add(1, Ordering::SeqCst);
                        0.0
                    }
                    _ => 0.0,
                };
                let reply = serde_json::json!({
                    "id": req["id"], "channel": req["channel"],
                    "instruction": req["instruction"], "success": true,
                    "data": data, "message": "",
                });
                write
                    .write_all(format!("{}\n", reply).as_bytes())
                    .await
                    .unwrap();
            }
        });
        Arc::new(DeviceSession::new(
            SessionConfig::default(),
            Arc::new(StreamConnector::new("sim", Box::new(local))),
        ))
    }

    async fn connected(volts: f64, running: bool) -> (SmartPumpController, Arc<AtomicUsize>) {
        let turn_ons = Arc::new(AtomicUsize::new(0));
        let session = spawn_device(volts, running, Arc::clone(&turn_ons));
        session.connect().await.unwrap();
        let controller = SmartPumpController::new(
            1,
            session,
            SmartPumpSettings::default(),
            ControllerConfig::default(),
        );
        (controller, turn_ons)
    }

    #[tokio::test]
    async fn test_status_polls_and_logs() {
        let (controller, _) = connected(1.65, false).await;

        let status = controller.status().await.unwrap();
        assert_eq!(status.raw_voltage, 1.65);
        assert!((status.humidity_pct - 50.0).abs() < 1e-9);
        assert_eq!(status.smoothed_humidity_pct, Some(status.humidity_pct));
        assert!(!status.pump_running);
        assert!(!status.synthetic);

        controller.status().await.unwrap();
        let history = controller.get_status_since(None);
        assert_eq!(history.raw_voltage.len(), 2);
        assert_eq!(history.smoothed_humidity_pct.len(), 2);
        assert_eq!(history.pump_running.len(), 2);
    }

    #[tokio::test]
    async fn test_smoothing_frozen_while_running() {
        let (controller, _) = connected(1.0, true).await;
        let status = controller.status().await.unwrap();
        assert!(status.pump_running);
        assert_eq!(status.smoothed_humidity_pct, None);
    }

    #[tokio::test]
    async fn test_smoothing_converges() {
        let (controller, _) = connected(2.0, false).await;
        controller.shared.smoothed_log.add_sample(1.0, Some(1.0));
        controller.shared.raw_log.add_sample(1.0, 1.0);
        controller.shared.running_log.add_sample(1.0, false);

        // Factor 1/10: 1.0 + 0.1 * (2.0 - 1.0)
        controller.status().await.unwrap();
        let (_, smoothed) = controller.shared.smoothed_log.get_newest_value().unwrap();
        assert!((smoothed.unwrap() - 1.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_last_status_does_not_poll() {
        let (controller, _) = connected(1.0, false).await;
        assert!(controller.last_status().is_none());

        let fresh = controller.status().await.unwrap();
        assert_eq!(controller.last_status(), Some(fresh));
    }

    #[tokio::test]
    async fn test_sample_times_strictly_increase() {
        let (controller, _) = connected(1.0, false).await;
        for _ in 0..5 {
            controller.status().await.unwrap();
        }
        let (times, _) = controller.shared.raw_log.get_values(None);
        for pair in times.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[tokio::test]
    async fn test_status_error_reaches_caller() {
        let session = Arc::new(DeviceSession::new(
            SessionConfig::default(),
            Arc::new(StreamConnector::new("sim", Box::new(tokio::io::duplex(64).0))),
        ));
        let controller = SmartPumpController::new(
            0,
            session,
            SmartPumpSettings::default(),
            ControllerConfig::default(),
        );
        assert!(matches!(
            controller.status().await,
            Err(ControllerError::Session(_))
        ));
        assert!(controller.turn_on().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_feedback_activates_pump() {
        let (controller, turn_ons) = connected(0.3, false).await;
        let settings = SmartPumpSettings::builder()
            .with_feedback_active(true)
            .with_feedback_setpoint_pct(60.0)
            .with_pump_on_time_s(1.0)
            .with_pump_update_time_s(10.0)
            .build()
            .unwrap();
        controller.set_settings(settings);
        controller.start();

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert!(turn_ons.load(Ordering::SeqCst) >= 1);

        controller.interrupt();
        controller.join().await;
        assert!(!controller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_feedback_above_setpoint() {
        let (controller, turn_ons) = connected(3.0, false).await;
        let settings = SmartPumpSettings::builder()
            .with_feedback_active(true)
            .with_feedback_setpoint_pct(50.0)
            .with_pump_on_time_s(1.0)
            .with_pump_update_time_s(10.0)
            .build()
            .unwrap();
        controller.set_settings(settings);
        controller.start();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(turn_ons.load(Ordering::SeqCst), 0);

        controller.interrupt();
        controller.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_stops_loop_promptly() {
        let (controller, _) = connected(1.0, false).await;
        controller.start();
        assert!(controller.is_running());

        tokio::time::sleep(Duration::from_secs(12)).await;
        let started = Instant::now();
        controller.interrupt();
        controller.join().await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!controller.is_running());
        assert!(controller.get_status_since(None).raw_voltage.len() >= 2);
    }

    #[tokio::test]
    async fn test_calibration_updates_settings() {
        let (controller, _) = connected(2.8, false).await;
        let settings = controller.calibrate_wet().await.unwrap();
        assert_eq!(settings.wet_reference_v(), 2.8);
        assert_eq!(controller.settings().wet_reference_v(), 2.8);

        // A dry reading above the wet reference is rejected.
        assert!(matches!(
            controller.calibrate_dry().await,
            Err(ControllerError::Validation(_))
        ));
        assert_eq!(controller.settings().dry_reference_v(), 0.0);
    }

    #[tokio::test]
    async fn test_history_round_trip() {
        let (controller, _) = connected(1.2, false).await;
        for _ in 0..3 {
            controller.status().await.unwrap();
        }
        let record = controller.export_history();

        let (other, _) = connected(1.2, false).await;
        other.import_history(record.clone()).unwrap();
        assert_eq!(other.export_history(), record);

        controller.clear_status_logs();
        assert!(controller.get_status_since(None).raw_voltage.is_empty());
    }

    #[tokio::test]
    async fn test_import_refused_during_poll() {
        let (controller, _) = connected(1.2, false).await;
        controller.status().await.unwrap();
        let before = controller.export_history();

        let newest = before.raw_voltage_times[0] + 10.0;
        let record = HistoryRecord {
            raw_voltage_times: vec![newest],
            raw_voltage_values: vec![1.0],
            smoothed_voltage_times: vec![newest],
            smoothed_voltage_values: vec![Some(1.0)],
            pump_running_times: vec![newest],
            pump_running_values: vec![false],
        };

        let poll = controller.shared.poll_lock.lock().await;
        assert!(matches!(
            controller.import_history(record.clone()),
            Err(ControllerError::PollInProgress(1))
        ));
        assert_eq!(controller.export_history(), before);
        drop(poll);

        controller.import_history(record).unwrap();
        let status = controller.status().await.unwrap();
        assert!(status.epoch_time > newest);
    }
}
