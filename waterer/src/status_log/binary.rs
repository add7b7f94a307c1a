//! Run-length compressed log for boolean state.

use std::collections::VecDeque;

use parking_lot::RwLock;

use super::{collect_since, StatusLogData, StatusLogError, DEFAULT_LOW_RES_MAX_AGE_S};

/// Number of leading samples kept unconditionally.
const UNCONDITIONAL_PREFIX: usize = 3;

/// Boolean time series storing edges rather than every sample.
///
/// Every `true` sample is kept, so pump runs are never lost. A run of equal
/// values is stored as its first sample plus a trailing sample whose time is
/// moved forward as the run continues. Samples older than the maximum age
/// relative to the newest sample are evicted.
#[derive(Debug)]
pub struct BinaryStatusLog {
    max_age_s: f64,
    samples: RwLock<VecDeque<(f64, bool)>>,
}

impl Default for BinaryStatusLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_RES_MAX_AGE_S)
    }
}

impl BinaryStatusLog {
    pub fn new(max_age_s: f64) -> Self {
        Self {
            max_age_s,
            samples: RwLock::new(VecDeque::new()),
        }
    }

    /// Append a sample taken at epoch time `time`.
    ///
    /// # Panics
    ///
    /// If `time` is not strictly greater than the newest sample's time.
    pub fn add_sample(&self, time: f64, value: bool) {
        let mut samples = self.samples.write();

        let len = samples.len();
        let last = samples.back().copied();
        if let Some((newest, _)) = last {
            assert!(
                time > newest,
                "status log samples must have increasing times ({} after {})",
                time,
                newest
            );
        }

        let run_continues = match (len.checked_sub(2).map(|i| samples[i]), last) {
            (Some((_, before)), Some((_, previous))) => previous == value && before == previous,
            _ => false,
        };

        if value || len < UNCONDITIONAL_PREFIX || !run_continues {
            samples.push_back((time, value));
        } else if let Some(tail) = samples.back_mut() {
            tail.0 = time;
        }

        while let Some((oldest, _)) = samples.front() {
            if time - *oldest <= self.max_age_s {
                break;
            }
            samples.pop_front();
        }
    }

    /// Times and values at or after `min_time`, oldest first.
    pub fn get_values(&self, min_time: Option<f64>) -> (Vec<f64>, Vec<bool>) {
        let samples = self.samples.read();
        collect_since(samples.iter(), samples.len(), min_time)
    }

    /// The most recent sample, if any.
    pub fn get_newest_value(&self) -> Option<(f64, bool)> {
        self.samples.read().back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.read().is_empty()
    }

    pub fn clear(&self) {
        self.samples.write().clear();
    }

    pub fn to_data(&self) -> StatusLogData<bool> {
        self.get_values(None).into()
    }

    /// Replace the contents with previously exported data.
    pub fn load_data(&self, data: StatusLogData<bool>) -> Result<(), StatusLogError> {
        data.validate()?;
        let rebuilt: VecDeque<(f64, bool)> = data.times.into_iter().zip(data.values).collect();
        *self.samples.write() = rebuilt;
        Ok(())
    }
}
