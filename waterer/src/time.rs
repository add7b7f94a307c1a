//! Time-related utility functions.
//!
//! Status samples are stamped with Unix epoch seconds as `f64`. The clock
//! below derives them from a wall-clock anchor plus elapsed tokio time, so
//! that runtime time control (paused tests) moves sample timestamps too.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

/// Smallest step used to keep successive timestamps strictly increasing.
pub const MIN_TIME_STEP_S: f64 = 1e-6;

/// Convert a `SystemTime` to Unix epoch seconds.
///
/// Times before the epoch map to negative values.
///
/// # Example
///
/// ```
/// use std::time::{Duration, UNIX_EPOCH};
/// use waterer::time::epoch_seconds;
///
/// let t = UNIX_EPOCH + Duration::from_millis(1500);
/// assert_eq!(epoch_seconds(t), 1.5);
/// ```
pub fn epoch_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    }
}

/// Epoch-seconds clock anchored at creation.
#[derive(Debug, Clone, Copy)]
pub struct EpochClock {
    anchor_epoch_s: f64,
    anchor: Instant,
}

impl EpochClock {
    pub fn new() -> Self {
        Self::anchored(epoch_seconds(SystemTime::now()))
    }

    fn anchored(epoch_s: f64) -> Self {
        Self {
            anchor_epoch_s: epoch_s,
            anchor: Instant::now(),
        }
    }

    /// Current time in epoch seconds.
    pub fn now(&self) -> f64 {
        self.anchor_epoch_s + self.anchor.elapsed().as_secs_f64()
    }

    /// Current time, nudged forward so it is strictly after `previous`.
    pub fn now_after(&self, previous: Option<f64>) -> f64 {
        let now = self.now();
        match previous {
            Some(previous) if now <= previous => previous + MIN_TIME_STEP_S,
            _ => now,
        }
    }
}

impl Default for EpochClock {
    fn default() -> Self {
        Self::new()
    }
}
