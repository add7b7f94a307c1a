//! Status command - read every channel once and print a table.

use tracing::warn;

use super::common::{format_status_row, status_header, DeviceArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the status command.
#[derive(Debug, Default)]
pub struct StatusArgs {
    pub device: DeviceArgs,
    pub verbose: bool,
}

/// Run the status command.
pub fn run(args: StatusArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("status");

    let mut config = runner.config().clone();
    args.device.apply(&mut config);

    runner.block_on(async {
        let session = runner.connect(&config).await?;
        let manager = runner.create_manager(session.clone(), &config)?;

        println!("{}", status_header());
        for channel in 0..manager.num_channels() {
            let name = manager.get_settings(channel)?.name().to_string();
            match manager.get_status(channel).await {
                Ok(status) => println!("{}", format_status_row(channel, &name, Some(&status))),
                Err(e) => {
                    warn!(channel, error = %e, "Failed to read channel status");
                    println!("{}  ({})", format_status_row(channel, &name, None), e);
                }
            }
        }

        session.disconnect().await;
        Ok::<(), CliError>(())
    })
}
