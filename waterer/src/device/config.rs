//! Configuration for the device session.

use std::time::Duration;

/// Default serial baud rate of the pump controller firmware.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default time to wait for the startup sentinel after opening the link.
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 5;

/// Default per-request response timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Line the firmware prints once it is ready to accept requests.
pub const DEFAULT_READY_SENTINEL: &str = "Arduino ready";

/// Configuration for a [`DeviceSession`](super::DeviceSession).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Link speed passed to the connector.
    pub baud_rate: u32,

    /// How long `connect` waits for the ready sentinel.
    pub handshake_timeout: Duration,

    /// How long one exchange waits for its response line.
    pub request_timeout: Duration,

    /// Sentinel line announced by the device after reset.
    pub ready_sentinel: String,

    /// Synthesize responses when no device is reachable.
    pub fallback: bool,
}

impl SessionConfig {
    /// Enable or disable fallback mode.
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Override the link speed.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            ready_sentinel: DEFAULT_READY_SENTINEL.to_string(),
            fallback: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.handshake_timeout, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.ready_sentinel, "Arduino ready");
        assert!(!config.fallback);
    }

    #[test]
    fn test_builder_methods() {
        let config = SessionConfig::default()
            .with_fallback(true)
            .with_request_timeout(Duration::from_millis(250));
        assert!(config.fallback);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
    }
}
