//! Error types for pump controllers and the pump manager.

use thiserror::Error;

use crate::device::{ConnectError, SessionError};
use crate::persistence::PersistenceError;
use crate::status_log::StatusLogError;

/// Rejected input at the API boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// A settings field violates its invariant.
    #[error("Invalid settings: {field} {reason}")]
    InvalidSettings { field: &'static str, reason: String },

    /// Channel index outside `0..num_channels`.
    #[error("Channel {channel} out of range (0..{num_channels})")]
    ChannelOutOfRange { channel: u32, num_channels: u32 },
}

impl ValidationError {
    pub(crate) fn settings(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidSettings {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors from a single channel controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to restore history: {0}")]
    History(#[from] StatusLogError),

    /// History cannot be replaced while a status poll is appending samples.
    #[error("Status poll in progress on channel {0}, history not restored")]
    PollInProgress(u32),
}

/// Errors from the pump manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Failed to connect to pump controller: {0}")]
    Connect(#[from] ConnectError),

    #[error("No {0} store configured")]
    StoreNotConfigured(&'static str),
}

impl From<SessionError> for ManagerError {
    fn from(e: SessionError) -> Self {
        ManagerError::Controller(ControllerError::Session(e))
    }
}
