//! Run command - start every channel's control loop until interrupted.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::common::{print_last_status, DeviceArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Default seconds between status tables.
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 30;

/// Arguments for the run command.
#[derive(Debug, Default)]
pub struct RunArgs {
    pub device: DeviceArgs,
    pub channels: Option<u32>,
    pub report_interval: Option<u64>,
    pub verbose: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("run");

    let mut config = runner.config().clone();
    args.device.apply(&mut config);
    if let Some(channels) = args.channels {
        if channels == 0 {
            return Err(CliError::Config("--channels must be at least 1".to_string()));
        }
        config.controller.num_channels = channels;
    }
    let report_interval = Duration::from_secs(
        args.report_interval
            .unwrap_or(DEFAULT_REPORT_INTERVAL_SECS)
            .max(1),
    );

    runner.block_on(async {
        let session = runner.connect(&config).await?;
        let manager = runner.create_manager(session.clone(), &config)?;

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Interrupt received, shutting down"),
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
            }
            signal.cancel();
        });

        manager.start();
        println!(
            "Controlling {} channel(s). Press Ctrl-C to stop.",
            manager.num_channels()
        );

        let mut report = tokio::time::interval(report_interval);
        report.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately, before any sample exists
        report.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,
                _ = report.tick() => {
                    println!();
                    print_last_status(&manager);
                }
            }
        }

        println!("Stopping control loops...");
        manager.interrupt().await;
        session.disconnect().await;
        println!("Stopped.");
        Ok::<(), CliError>(())
    })
}
