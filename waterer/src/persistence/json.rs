//! JSON files in a single directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{HistoryStore, PersistenceError, SettingsStore};
use crate::pump::{HistoryRecord, SmartPumpSettings};

/// File holding the settings array.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Prefix of per-channel history files (`history_<channel>.json`).
pub const HISTORY_FILE_PREFIX: &str = "history_";

/// Settings and history as pretty-printed JSON files.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    directory: PathBuf,
}

impl JsonFileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn settings_path(&self) -> PathBuf {
        self.directory.join(SETTINGS_FILE_NAME)
    }

    pub fn history_path(&self, channel: u32) -> PathBuf {
        self.directory.join(format!("{}{}.json", HISTORY_FILE_PREFIX, channel))
    }

    fn write_json<T: Serialize + ?Sized>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.directory).map_err(|source| PersistenceError::Io {
            path: self.directory.clone(),
            source,
        })?;

        let content =
            serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Encode {
                path: path.to_path_buf(),
                source,
            })?;

        // Write then rename so a crash never leaves a truncated file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|source| PersistenceError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "Wrote JSON file");
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, PersistenceError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| PersistenceError::Decode {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl SettingsStore for JsonFileStore {
    fn save_settings(&self, settings: &[SmartPumpSettings]) -> Result<PathBuf, PersistenceError> {
        let path = self.settings_path();
        self.write_json(&path, settings)?;
        Ok(path)
    }

    fn load_settings(&self) -> Result<Option<Vec<SmartPumpSettings>>, PersistenceError> {
        self.read_json(&self.settings_path())
    }
}

impl HistoryStore for JsonFileStore {
    fn save_history(
        &self,
        channel: u32,
        record: &HistoryRecord,
    ) -> Result<PathBuf, PersistenceError> {
        let path = self.history_path(channel);
        self.write_json(&path, record)?;
        Ok(path)
    }

    fn load_history(&self, channel: u32) -> Result<Option<HistoryRecord>, PersistenceError> {
        self.read_json(&self.history_path(channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_load_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        assert!(store.load_settings().unwrap().is_none());
        assert!(store.load_history(0).unwrap().is_none());
    }

    #[test]
    fn test_settings_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("nested"));

        let settings = vec![
            SmartPumpSettings::default(),
            SmartPumpSettings::builder()
                .with_name("basil")
                .with_feedback_active(true)
                .build()
                .unwrap(),
        ];
        let path = store.save_settings(&settings).unwrap();
        assert_eq!(path, store.settings_path());
        assert!(path.exists());

        assert_eq!(store.load_settings().unwrap(), Some(settings));
    }

    #[test]
    fn test_history_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        let record = HistoryRecord {
            raw_voltage_times: vec![1.0, 2.0],
            raw_voltage_values: vec![1.5, 1.4],
            smoothed_voltage_times: vec![1.0, 2.0],
            smoothed_voltage_values: vec![Some(1.5), None],
            pump_running_times: vec![1.0, 2.0],
            pump_running_values: vec![false, true],
        };
        let path = store.save_history(3, &record).unwrap();
        assert!(path.ends_with("history_3.json"));
        assert_eq!(store.load_history(3).unwrap(), Some(record));
    }

    #[test]
    fn test_invalid_settings_file_is_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());
        fs::write(
            store.settings_path(),
            r#"[{"pump_on_time_s": 99.0, "pump_update_time_s": 1.0}]"#,
        )
        .unwrap();

        assert!(matches!(
            store.load_settings(),
            Err(PersistenceError::Decode { .. })
        ));
    }
}

#[cfg(test)]
mod roundtrip_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_history_reloads_bit_exact() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        let times: Vec<f64> = (0..5000)
            .map(|i| 1_760_000_000.123_456 + i as f64 * 5.000_137)
            .collect();
        let volts: Vec<f64> = (0..5000)
            .map(|i| 1.65 + 1.2 * (i as f64 * 0.013).sin() / 3.0)
            .collect();
        let record = HistoryRecord {
            raw_voltage_times: times.clone(),
            raw_voltage_values: volts.clone(),
            smoothed_voltage_times: times.clone(),
            smoothed_voltage_values: volts
                .iter()
                .enumerate()
                .map(|(i, v)| (i % 7 != 0).then_some(v * 0.9))
                .collect(),
            pump_running_times: vec![times[0], times[4999]],
            pump_running_values: vec![false, true],
        };

        store.save_history(3, &record).unwrap();
        let loaded = store.load_history(3).unwrap().unwrap();

        let mismatches = loaded
            .raw_voltage_times
            .iter()
            .chain(&loaded.raw_voltage_values)
            .zip(record.raw_voltage_times.iter().chain(&record.raw_voltage_values))
            .filter(|(a, b)| a.to_bits() != b.to_bits())
            .count();
        assert_eq!(mismatches, 0);
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_missing_files_load_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("absent"));
        assert!(store.load_settings().unwrap().is_none());
        assert!(store.load_history(0).unwrap().is_none());
    }

    #[test]
    fn test_settings_written_atomically() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());
        let path = store
            .save_settings(&[SmartPumpSettings::default()])
            .unwrap();
        assert_eq!(path, temp_dir.path().join(SETTINGS_FILE_NAME));
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(store.load_settings().unwrap().unwrap().len(), 1);
    }
}
