mod cli;
mod error;
mod logging;
mod output;

use clap::Parser;
use tracing::error;

use bhavscan_core::{Pipeline, SystemClock};

use crate::cli::Cli;
use crate::error::CliError;

// Failures are logged; the exit status is always 0.
fn main() {
    let cli = Cli::parse();
    if let Err(error) = logging::init() {
        println!("error: {error}");
    }

    if let Err(error) = run(&cli) {
        error!(code = error.code(), "{error}");
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = cli.scan_config();
    let store = config.table_format.open_store();

    let report = Pipeline::new(&config, &SystemClock, store.as_ref()).run()?;
    output::render(&report, cli.format, cli.pretty)?;

    Ok(())
}
