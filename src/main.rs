//! Sitekit - command-line static-site asset pipeline

use std::process::ExitCode;

use sitekit::cli;

fn main() -> ExitCode {
    cli::run()
}
