use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Installs a stdout fmt subscriber. `RUST_LOG` overrides the `info` default.
pub fn init() -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stdout)
        .try_init()
        .map_err(|error| CliError::Logging(error.to_string()))
}
