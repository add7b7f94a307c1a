//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`run`] - Main command (run all control loops until Ctrl-C)
//! - [`status`] - One-shot status of every channel

pub mod common;
pub mod config;
pub mod run;
pub mod status;
