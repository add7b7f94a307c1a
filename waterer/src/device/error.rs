//! Error types for the device link.

use std::io;
use std::time::Duration;

use thiserror::Error;

use super::protocol::Instruction;

/// Errors raised while decoding or correlating a device response.
///
/// These are always surfaced to the caller of an exchange. A correlation
/// mismatch means the shared link carried a reply meant for someone else.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Response id does not match the request id.
    #[error("Correlation mismatch: expected response id {expected}, got {actual}")]
    CorrelationMismatch { expected: u64, actual: u64 },

    /// The frame could not be parsed as a response object.
    #[error("Failed to parse response frame: {0}")]
    Deserialize(String),

    /// A required key is absent from an otherwise parseable frame.
    #[error("Response frame is missing required field '{0}'")]
    MissingField(&'static str),

    /// The device reported an instruction outside the known vocabulary.
    #[error("Unknown instruction '{0}'")]
    UnknownInstruction(String),
}

/// Errors raised by the byte-level link.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No line arrived within the request timeout.
    #[error("Timed out after {0:?} waiting for a response")]
    Timeout(Duration),

    /// The remote end closed the link.
    #[error("Device disconnected")]
    Disconnected,

    /// No link is open.
    #[error("Device link is not open")]
    NotOpen,

    /// The link could not be opened.
    #[error("Failed to open device link: {0}")]
    Open(String),

    /// Underlying I/O failure.
    #[error("I/O error on device link: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while connecting a session.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Opening or reading the link failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The startup sentinel line never arrived.
    #[error("Device did not announce '{sentinel}' within {timeout:?}")]
    HandshakeTimeout { sentinel: String, timeout: Duration },
}

/// Errors raised by a request issued through a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The device answered with `success = false`.
    ///
    /// `message` is passed through exactly as the device sent it.
    #[error("Device rejected {instruction}: {message}")]
    Rejected {
        instruction: Instruction,
        message: String,
    },
}

impl SessionError {
    /// Returns true for link-level failures that a polling loop may retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::Transport(_))
    }
}
