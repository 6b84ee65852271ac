#![allow(clippy::print_stderr)]

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

use j2py_cli::args::CliArgs;
use j2py_cli::{driver, tracing_config};

fn main() -> ExitCode {
    // Only installs a subscriber when J2PY_LOG or RUST_LOG is set.
    tracing_config::init_tracing();

    let args = CliArgs::parse();
    match driver::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
