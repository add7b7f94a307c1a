//! Configuration management CLI commands.
//!
//! `config get`, `config set`, `config list`, and `config path` operate on
//! `~/.waterer/config.ini` without touching the pump controller.

use std::path::Path;

use clap::Subcommand;
use waterer::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., device.port)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., device.port)
        key: String,

        /// Value to set (an empty string clears optional values)
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    let path = config_file_path();
    match command {
        ConfigCommands::Get { key } => {
            let config = ConfigFile::load_from(&path)?;
            println!("{}", display_value(&get_value(&config, &key)?));
        }
        ConfigCommands::Set { key, value } => {
            let key = set_value(&path, &key, &value)?;
            println!("Set {} = {}", key.name(), display_value(value.trim()));
        }
        ConfigCommands::List => {
            let config = ConfigFile::load_from(&path)?;
            print!("{}", list_settings(&config));
        }
        ConfigCommands::Path => println!("{}", path.display()),
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'waterer config list' to see available keys.",
            key
        ))
    })
}

fn get_value(config: &ConfigFile, key: &str) -> Result<String, CliError> {
    Ok(parse_key(key)?.get(config))
}

/// Validate and store one value. A broken config file is reported, not replaced.
fn set_value(path: &Path, key: &str, value: &str) -> Result<ConfigKey, CliError> {
    let config_key = parse_key(key)?;
    let mut config = ConfigFile::load_from(path)?;
    config_key
        .set(&mut config, value)
        .map_err(|e| CliError::Config(e.to_string()))?;
    config.save_to(path)?;
    Ok(config_key)
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

/// Render all settings grouped by section, marking non-default values.
fn list_settings(config: &ConfigFile) -> String {
    let defaults = ConfigFile::default();
    let mut out = String::from("Configuration Settings\n======================\n");
    let mut current_section = "";

    for key in ConfigKey::all() {
        if key.section() != current_section {
            current_section = key.section();
            out.push_str(&format!("\n[{}]\n", current_section));
        }

        let value = key.get(config);
        let default = key.get(&defaults);
        out.push_str(&format!("  {} = {}", key.key_name(), display_value(&value)));
        if value != default {
            out.push_str(&format!("  (default: {})", display_value(&default)));
        }
        out.push('\n');
    }
    out
}
