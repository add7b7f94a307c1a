//! Bounded-memory time series for per-channel status history.
//!
//! Two retention policies share one query contract:
//!
//! - [`StatusLog`] keeps every sample younger than a switchover age, then
//!   thins older samples to a fixed spacing and drops them after a maximum
//!   age. Used for sensor readings.
//! - [`BinaryStatusLog`] run-length compresses a boolean signal, never
//!   losing a `true` sample. Used for pump running state.
//!
//! Both are internally synchronized: one writer (the channel's control
//! loop) and any number of readers. Every mutation happens under a single
//! write lock, so readers never see a half-applied update.
//!
//! # Example
//!
//! ```
//! use waterer::status_log::{StatusLog, StatusLogConfig};
//!
//! let log = StatusLog::new(StatusLogConfig::default());
//! log.add_sample(1.0, 2.5);
//! log.add_sample(2.0, 2.4);
//!
//! let (times, values) = log.get_values(Some(1.5));
//! assert_eq!(times, vec![2.0]);
//! assert_eq!(values, vec![2.4]);
//! ```

mod binary;
mod config;
mod continuous;

pub use binary::BinaryStatusLog;
pub use config::{
    StatusLogConfig, DEFAULT_LOW_RES_INTERVAL_S, DEFAULT_LOW_RES_MAX_AGE_S,
    DEFAULT_SWITCHOVER_AGE_S,
};
pub use continuous::StatusLog;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when importing exported log data.
#[derive(Debug, Error, PartialEq)]
pub enum StatusLogError {
    /// Times and values have different lengths.
    #[error("Log data has {times} times but {values} values")]
    LengthMismatch { times: usize, values: usize },

    /// Times are not strictly increasing.
    #[error("Log times must be strictly increasing (index {index}: {time} follows {previous})")]
    NotIncreasing {
        index: usize,
        previous: f64,
        time: f64,
    },
}

/// Full contents of a log as parallel arrays, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusLogData<T> {
    pub times: Vec<f64>,
    pub values: Vec<T>,
}

impl<T> StatusLogData<T> {
    pub fn new(times: Vec<f64>, values: Vec<T>) -> Self {
        Self { times, values }
    }

    pub fn empty() -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Check that the data could have been produced by a log.
    pub fn validate(&self) -> Result<(), StatusLogError> {
        if self.times.len() != self.values.len() {
            return Err(StatusLogError::LengthMismatch {
                times: self.times.len(),
                values: self.values.len(),
            });
        }
        for (index, pair) in self.times.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(StatusLogError::NotIncreasing {
                    index: index + 1,
                    previous: pair[0],
                    time: pair[1],
                });
            }
        }
        Ok(())
    }
}

impl<T> From<(Vec<f64>, Vec<T>)> for StatusLogData<T> {
    fn from((times, values): (Vec<f64>, Vec<T>)) -> Self {
        Self { times, values }
    }
}

/// Collect the samples at or after `min_time`, oldest first.
///
/// The suffix start is found by scanning backwards from the newest sample,
/// which is cheap for the usual "recent history" query.
pub(crate) fn collect_since<'a, T, I>(
    samples: I,
    total: usize,
    min_time: Option<f64>,
) -> (Vec<f64>, Vec<T>)
where
    T: Clone + 'a,
    I: DoubleEndedIterator<Item = &'a (f64, T)> + Clone,
{
    let start = match min_time {
        None => 0,
        Some(floor) => {
            let newer = samples
                .clone()
                .rev()
                .take_while(|(t, _)| *t >= floor)
                .count();
            total - newer
        }
    };

    samples
        .skip(start)
        .map(|(t, v)| (*t, v.clone()))
        .unzip()
}
