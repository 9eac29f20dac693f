//! CLI module - command-line interface
//!
//! Logging setup, subcommand handlers and the entry point shared by the
//! standalone check binaries.

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::core::Config;
use crate::harness::catalog;

pub use commands::OutputFormat;

/// Install the stderr log subscriber. `RUST_LOG` wins over `debug`.
pub fn init_logging(debug: bool) {
    let default = if debug { "pagecheck=debug" } else { "pagecheck=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Output path used by the standalone binaries
pub const STANDALONE_OUTPUT: &str = "verification/verification.png";

/// Entry point of an argument-less check binary: run one built-in scenario
/// and map its outcome to the exit code.
pub async fn run_standalone(name: &str) -> ExitCode {
    init_logging(false);

    let config = match Config::load().and_then(|c| c.validate().map(|()| c)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let scenario = match catalog::builtin(name, &config.target.url, PathBuf::from(STANDALONE_OUTPUT))
    {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match commands::run(&config, &[scenario], OutputFormat::Text, false).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
