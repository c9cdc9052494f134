use std::error::Error;
use std::io::{self, Write};
use std::process::ExitCode;

use frp_managerd::{LaunchError, run_daemon};

fn main() -> ExitCode {
    match run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Telemetry is not installed when configuration fails to load.
            let _stderr_closed = write_error_chain(&error);
            ExitCode::FAILURE
        }
    }
}

fn write_error_chain(error: &LaunchError) -> io::Result<()> {
    let mut stderr = io::stderr().lock();
    writeln!(stderr, "frp-managerd: {error}")?;
    let mut source = error.source();
    while let Some(cause) = source {
        writeln!(stderr, "  caused by: {cause}")?;
        source = cause.source();
    }
    Ok(())
}
