//! Two-tier log for continuous readings.

use std::collections::VecDeque;

use parking_lot::RwLock;

use super::{collect_since, StatusLogConfig, StatusLogData, StatusLogError};

#[derive(Debug)]
struct Tiers<T> {
    /// Every sample younger than the switchover age, oldest first.
    high: VecDeque<(f64, T)>,
    /// Thinned older samples, oldest first.
    low: VecDeque<(f64, T)>,
}

impl<T> Tiers<T> {
    fn new() -> Self {
        Self {
            high: VecDeque::new(),
            low: VecDeque::new(),
        }
    }

    fn len(&self) -> usize {
        self.low.len() + self.high.len()
    }
}

/// Time series with a full-resolution recent window and a thinned history.
///
/// `T` is the stored value; readings use `f64`, smoothed readings that may
/// be absent use `Option<f64>`.
#[derive(Debug)]
pub struct StatusLog<T> {
    config: StatusLogConfig,
    tiers: RwLock<Tiers<T>>,
}

impl<T: Clone> StatusLog<T> {
    pub fn new(config: StatusLogConfig) -> Self {
        Self {
            config,
            tiers: RwLock::new(Tiers::new()),
        }
    }

    pub fn config(&self) -> &StatusLogConfig {
        &self.config
    }

    /// Append a sample taken at epoch time `time`.
    ///
    /// # Panics
    ///
    /// If `time` is not strictly greater than the newest sample's time.
    pub fn add_sample(&self, time: f64, value: T) {
        let mut tiers = self.tiers.write();

        if let Some((newest, _)) = tiers.high.back() {
            assert!(
                time > *newest,
                "status log samples must have increasing times ({} after {})",
                time,
                newest
            );
        }
        tiers.high.push_back((time, value));

        // Demote aged samples, keeping the one just added.
        while tiers.high.len() > 1 {
            let Some((oldest, _)) = tiers.high.front() else {
                break;
            };
            if time - *oldest < self.config.switchover_age_s {
                break;
            }
            let Some((old_time, old_value)) = tiers.high.pop_front() else {
                break;
            };
            let keep = match tiers.low.back() {
                None => true,
                Some((last_low, _)) => old_time - *last_low > self.config.low_res_interval_s,
            };
            if keep {
                tiers.low.push_back((old_time, old_value));
            }
        }

        while let Some((oldest, _)) = tiers.low.front() {
            if time - *oldest <= self.config.max_age_s {
                break;
            }
            tiers.low.pop_front();
        }
    }

    /// Times and values at or after `min_time`, oldest first.
    ///
    /// `None` returns everything: low-resolution tier, then high-resolution.
    pub fn get_values(&self, min_time: Option<f64>) -> (Vec<f64>, Vec<T>) {
        let tiers = self.tiers.read();
        collect_since(
            tiers.low.iter().chain(tiers.high.iter()),
            tiers.len(),
            min_time,
        )
    }

    /// The most recent sample, if any.
    pub fn get_newest_value(&self) -> Option<(f64, T)> {
        self.tiers.read().high.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.tiers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut tiers = self.tiers.write();
        tiers.high.clear();
        tiers.low.clear();
    }

    /// Export both tiers, oldest first.
    pub fn to_data(&self) -> StatusLogData<T> {
        self.get_values(None).into()
    }

    /// Replace the contents with previously exported data.
    ///
    /// Samples are assigned to tiers by their age relative to the newest
    /// sample, so `to_data` afterwards returns exactly `data`.
    pub fn load_data(&self, data: StatusLogData<T>) -> Result<(), StatusLogError> {
        data.validate()?;

        let newest = data.times.last().copied();
        let mut rebuilt = Tiers::new();
        for (time, value) in data.times.into_iter().zip(data.values) {
            let recent = newest.is_some_and(|n| n - time < self.config.switchover_age_s);
            if recent || Some(time) == newest {
                rebuilt.high.push_back((time, value));
            } else {
                rebuilt.low.push_back((time, value));
            }
        }

        *self.tiers.write() = rebuilt;
        Ok(())
    }
}
