//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use waterer::config::ConfigFileError;
use waterer::device::ConnectError;
use waterer::pump::ManagerError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to reach the pump controller
    Connect(ConnectError),
    /// Pump manager operation failed
    Manager(ManagerError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Connect(_) | CliError::Manager(ManagerError::Connect(_)) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Wrong port: set it with --port or");
                eprintln!("     'waterer config set device.port <path>'");
                eprintln!("  2. Permissions: on Linux, add your user to the 'dialout' group");
                eprintln!("  3. No hardware: use --fallback to run with synthetic readings");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Use 'waterer config list' to see available keys and current values.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Connect(e) => write!(f, "Failed to connect to pump controller: {}", e),
            CliError::Manager(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Connect(e) => Some(e),
            CliError::Manager(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ConnectError> for CliError {
    fn from(e: ConnectError) -> Self {
        CliError::Connect(e)
    }
}

impl From<ManagerError> for CliError {
    fn from(e: ManagerError) -> Self {
        CliError::Manager(e)
    }
}
