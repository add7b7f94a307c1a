//! Pump controller link.
//!
//! Everything needed to talk to the pump controller firmware over its
//! single shared serial link:
//!
//! - [`protocol`] - request/response frames and correlation
//! - [`transport`] - line-oriented byte stream and connectors
//! - [`session`] - connection lifecycle and serialized exchanges
//! - [`fallback`] - synthetic responses when no hardware is attached
//!
//! # Error Taxonomy
//!
//! | Kind | Type | Handling |
//! |------|------|----------|
//! | Link | [`TransportError`] | Retried by polling loops, raised for one-shot commands |
//! | Frame | [`ProtocolError`] | Always raised to the caller |
//! | Device | [`SessionError::Rejected`] | Raised with the device message |
//! | Startup | [`ConnectError`] | Fatal unless fallback is enabled |

mod config;
mod error;
pub mod fallback;
pub mod protocol;
mod session;
pub mod transport;

pub use config::{
    SessionConfig, DEFAULT_BAUD_RATE, DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_READY_SENTINEL,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use error::{ConnectError, ProtocolError, SessionError, TransportError};
pub use protocol::{Instruction, Request, Response};
pub use session::{DeviceSession, SharedSession};
pub use transport::{Connector, DynSerial, SerialConnector, StreamConnector};
