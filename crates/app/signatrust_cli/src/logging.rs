pub mod formats;

use flexi_logger::Logger;

use crate::Error;

/// Starts the logger on stderr so stdout carries command output only.
/// `RUST_LOG` wins over the default spec.
pub fn init(verbose: bool) -> Result<(), Error> {
    let spec = if verbose { "debug" } else { "info" };
    Logger::try_with_env_or_str(spec)?
        .format(formats::cli_format)
        .log_to_stderr()
        .start()?;

    Ok(())
}
