//! Waterer CLI - Command-line interface
//!
//! This binary drives a pump controller through the Waterer library.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::common::DeviceArgs;
use commands::config::ConfigCommands;
use commands::run::RunArgs;
use commands::status::StatusArgs;

#[derive(Parser)]
#[command(name = "waterer")]
#[command(version)]
#[command(about = "Moisture-feedback irrigation controller", long_about = None)]
struct Cli {
    /// Mirror log output to the terminal
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every channel's control loop until Ctrl-C
    Run {
        #[command(flatten)]
        device: DeviceArgs,

        /// Number of pump channels (overrides controller.num_channels)
        #[arg(long)]
        channels: Option<u32>,

        /// Seconds between status tables
        #[arg(long)]
        report_interval: Option<u64>,
    },

    /// Read every channel once and print its status
    Status {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// View or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            device,
            channels,
            report_interval,
        } => commands::run::run(RunArgs {
            device,
            channels,
            report_interval,
            verbose: cli.verbose,
        }),
        Commands::Status { device } => commands::status::run(StatusArgs {
            device,
            verbose: cli.verbose,
        }),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
