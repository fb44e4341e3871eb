use clap::Parser;
use cuprum_logger::{self as logger, Verbosity};
use cuprum_plugins::{Cli, CliError};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Internal diagnostics from the library crates; off unless CUPRUM_LOG is set
fn init_tracing() {
    let filter = EnvFilter::try_from_env("CUPRUM_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .without_time()
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(Verbosity::from_flags(cli.global.verbose, cli.global.quiet));
    init_tracing();
    logger::debug(&format!("Log file: {}", logger::get_log_path_string()));

    match cuprum_plugins::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logger::error(&err.to_string());
            exit_code_for(&err)
        }
    }
}

/// Exit statuses are a byte; codes that do not fit become a plain failure
fn exit_code_for(err: &CliError) -> ExitCode {
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
}
