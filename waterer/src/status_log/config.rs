//! Retention settings for status logs.

/// Samples younger than this stay at full resolution (1 hour).
pub const DEFAULT_SWITCHOVER_AGE_S: f64 = 3600.0;

/// Minimum spacing of low-resolution samples (5 minutes).
pub const DEFAULT_LOW_RES_INTERVAL_S: f64 = 300.0;

/// Samples older than this are discarded (7 days).
pub const DEFAULT_LOW_RES_MAX_AGE_S: f64 = 7.0 * 24.0 * 3600.0;

/// Retention settings shared by all logs of a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusLogConfig {
    /// Age at which samples move to the low-resolution tier.
    pub switchover_age_s: f64,

    /// Low-resolution samples closer than this to their predecessor are dropped.
    pub low_res_interval_s: f64,

    /// Age after which samples are evicted. Also the binary log's horizon.
    pub max_age_s: f64,
}

impl StatusLogConfig {
    pub fn new(switchover_age_s: f64, low_res_interval_s: f64, max_age_s: f64) -> Self {
        Self {
            switchover_age_s,
            low_res_interval_s,
            max_age_s,
        }
    }
}

impl Default for StatusLogConfig {
    fn default() -> Self {
        Self {
            switchover_age_s: DEFAULT_SWITCHOVER_AGE_S,
            low_res_interval_s: DEFAULT_LOW_RES_INTERVAL_S,
            max_age_s: DEFAULT_LOW_RES_MAX_AGE_S,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StatusLogConfig::default();
        assert_eq!(config.switchover_age_s, 3600.0);
        assert_eq!(config.low_res_interval_s, 300.0);
        assert_eq!(config.max_age_s, 604_800.0);
    }
}
