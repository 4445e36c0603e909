//! rvl - Command-line tool for previewing reward reveal animations

use std::process::ExitCode;

use reward_reveal::cli;

fn main() -> ExitCode {
    cli::run()
}
