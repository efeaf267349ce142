use std::process::ExitCode;

use clap::Parser;
use rsum_core::RunStatus;
use tracing_subscriber::EnvFilter;

use crate::cli::App;
use crate::cli::app::LogLevel;

mod cli;
mod env;
mod ui;

/// `RUST_LOG` wins over `--log-level`. Logs go to stderr; stdout carries
/// manifest lines and reports.
fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(status: RunStatus) -> ExitCode {
    match status {
        RunStatus::Success => ExitCode::SUCCESS,
        RunStatus::Mismatch => ExitCode::from(1),
        RunStatus::Failure => ExitCode::from(2),
    }
}

fn main() -> ExitCode {
    let app = App::parse();
    init_tracing(app.log_level);

    match cli::run(app) {
        Ok(status) => exit_code(status),
        Err(e) => {
            eprintln!("rsum: {e:#}");
            exit_code(RunStatus::Failure)
        }
    }
}
