//! Device session: connection lifecycle and serialized request exchange.
//!
//! The pump controller sits behind one half-duplex link shared by every
//! channel's control loop and by external callers. [`DeviceSession`] owns
//! that link behind a FIFO-fair async mutex, so at most one request is
//! outstanding at any time and no caller waits indefinitely.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use waterer::device::{DeviceSession, Instruction, SerialConnector, SessionConfig};
//!
//! let session = Arc::new(DeviceSession::new(
//!     SessionConfig::default(),
//!     Arc::new(SerialConnector::new(None)),
//! ));
//! session.connect().await?;
//! let volts = session.get_voltage(0).await?;
//! session.disconnect().await;
//! ```
//!
//! Dropping the session closes the port even if `disconnect` is never
//! called.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::error::{ConnectError, SessionError, TransportError};
use super::fallback;
use super::protocol::{self, Instruction, Request, Response};
use super::transport::{Connector, LineTransport};

/// Shared handle to a device session.
pub type SharedSession = Arc<DeviceSession>;

/// Connection to one pump controller.
pub struct DeviceSession {
    config: SessionConfig,
    connector: Arc<dyn Connector>,
    /// The transport mutex. `None` while disconnected.
    link: Mutex<Option<LineTransport>>,
    next_id: AtomicU64,
    /// Set once fallback mode has taken over, so the warning is logged once.
    degraded: AtomicBool,
}

impl DeviceSession {
    pub fn new(config: SessionConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            link: Mutex::new(None),
            next_id: AtomicU64::new(1),
            degraded: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open the link and wait for the ready sentinel.
    ///
    /// With fallback enabled, a failure here is logged and the session
    /// continues with synthetic responses instead of returning an error.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let mut link = self.link.lock().await;
        if link.is_some() {
            debug!("Device session already connected");
            return Ok(());
        }

        let destination = self.connector.destination();
        info!(
            destination = %destination,
            baud_rate = self.config.baud_rate,
            "Connecting to pump controller"
        );

        match self.open_and_handshake().await {
            Ok(transport) => {
                *link = Some(transport);
                self.degraded.store(false, Ordering::Release);
                info!(destination = %destination, "Pump controller ready");
                Ok(())
            }
            Err(e) if self.config.fallback => {
                self.degrade(&e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn open_and_handshake(&self) -> Result<LineTransport, ConnectError> {
        let stream = self.connector.open(self.config.baud_rate)?;
        let mut transport = LineTransport::new(stream);

        let ready = transport
            .wait_for_line(&self.config.ready_sentinel, self.config.handshake_timeout)
            .await?;
        if !ready {
            return Err(ConnectError::HandshakeTimeout {
                sentinel: self.config.ready_sentinel.clone(),
                timeout: self.config.handshake_timeout,
            });
        }
        Ok(transport)
    }

    /// Close the link. Closing an unopened session only logs a warning.
    pub async fn disconnect(&self) {
        let mut link = self.link.lock().await;
        match link.take() {
            Some(mut transport) => {
                if let Err(e) = transport.shutdown().await {
                    debug!(error = %e, "Error while shutting down device link");
                }
                info!("Disconnected from pump controller");
            }
            None => warn!("Disconnect requested but no device link is open"),
        }
    }

    /// Whether a physical link is currently open.
    pub async fn is_connected(&self) -> bool {
        self.link.lock().await.is_some()
    }

    /// Whether responses are currently being synthesized.
    pub fn is_synthetic(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn degrade(&self, reason: &dyn std::fmt::Display) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            warn!(
                error = %reason,
                "Pump controller unavailable, falling back to synthetic data"
            );
        }
    }

    /// Send one request and return its correlated response.
    ///
    /// Holds the transport mutex for the write and the read, then decodes
    /// and verifies the correlation id after releasing it.
    pub async fn exchange(&self, request: &Request) -> Result<Response, SessionError> {
        let frame = protocol::encode(request);

        let reply = {
            let mut link = self.link.lock().await;
            let Some(transport) = link.as_mut() else {
                if self.config.fallback {
                    self.degrade(&TransportError::NotOpen);
                    return Ok(fallback::synthesize(request));
                }
                return Err(TransportError::NotOpen.into());
            };

            match Self::round_trip(transport, &frame, self.config.request_timeout).await {
                Ok(reply) => reply,
                Err(TransportError::Disconnected) => {
                    *link = None;
                    if self.config.fallback {
                        self.degrade(&TransportError::Disconnected);
                        return Ok(fallback::synthesize(request));
                    }
                    warn!("Pump controller closed the link");
                    return Err(TransportError::Disconnected.into());
                }
                Err(e) => return Err(e.into()),
            }
        };

        let response = protocol::decode_frame(&reply)?;
        protocol::verify_correlation(request, &response)?;

        debug!(
            id = request.id,
            channel = request.channel,
            instruction = %request.instruction,
            success = response.success,
            data = response.data,
            "Exchange complete"
        );
        Ok(response)
    }

    async fn round_trip(
        transport: &mut LineTransport,
        frame: &str,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        transport.clear_stale().await?;
        transport.write_frame(frame).await?;
        transport.read_frame(timeout).await
    }

    /// Issue `instruction` on `channel`, failing if the device rejects it.
    pub async fn request(
        &self,
        channel: u32,
        instruction: Instruction,
        data: i64,
    ) -> Result<Response, SessionError> {
        let request = Request::new(channel, instruction, data, self.next_id());
        let response = self.exchange(&request).await?;
        if !response.success {
            return Err(SessionError::Rejected {
                instruction,
                message: response.message,
            });
        }
        Ok(response)
    }

    /// Read the sensor voltage of `channel`.
    pub async fn get_voltage(&self, channel: u32) -> Result<f64, SessionError> {
        Ok(self.request(channel, Instruction::GetVoltage, 0).await?.data)
    }

    /// Read whether the pump on `channel` is running.
    pub async fn get_state(&self, channel: u32) -> Result<bool, SessionError> {
        Ok(self.request(channel, Instruction::GetState, 0).await?.data != 0.0)
    }

    /// Run the pump on `channel` for `duration`.
    ///
    /// The payload is the run time in whole milliseconds.
    pub async fn turn_on(&self, channel: u32, duration: Duration) -> Result<(), SessionError> {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        self.request(channel, Instruction::TurnOn, millis).await?;
        Ok(())
    }

    /// Stop the pump on `channel`.
    pub async fn turn_off(&self, channel: u32) -> Result<(), SessionError> {
        self.request(channel, Instruction::TurnOff, 0).await?;
        Ok(())
    }
}
