//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use safespot_cli::{CliError, run};

#[expect(
    clippy::print_stderr,
    reason = "the binary reports failures on stderr before exiting"
)]
fn main() {
    match run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("safespot: {err}");
            std::process::exit(1);
        }
    }
}
