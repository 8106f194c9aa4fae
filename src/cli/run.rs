//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, loads configuration, creates the tokio runtime,
//! dispatches to a command and owns all error output.

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;
use crate::{Config, ExitCode, ForgeError};
use pageforge_utils::logging::init_tracing;

/// Main CLI execution function.
///
/// Prints everything, including errors, and returns the exit code to use
/// on failure. `main.rs` only calls `std::process::exit`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let operation = cli.operation();

    // Classification is local and works even with a broken config file.
    if let Commands::Classify { goal } = &cli.command {
        return commands::execute_classify_command(goal).map_err(|e| report_error(&e, operation));
    }

    let cli_args = cli.to_cli_args();
    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Generate {
                goal, print, json, ..
            } => commands::execute_generate_command(&goal, print, json, &config).await,
            Commands::Plan { goal } => commands::execute_plan_command(&goal, &config).await,
            Commands::Config { json } => commands::execute_config_command(&config, json),
            Commands::Classify { goal } => commands::execute_classify_command(&goal),
        }
    });

    result.map_err(|e| report_error(&e, operation))
}

/// Print an error for the user and pick the exit code.
fn report_error(error: &anyhow::Error, operation: &str) -> ExitCode {
    if let Some(forge_error) = error.downcast_ref::<ForgeError>() {
        eprintln!("{}", forge_error.display_for_user());
        if !matches!(forge_error, ForgeError::Config(_) | ForgeError::EmptyGoal) {
            eprintln!("  (during: {operation}; run with --verbose for stage logs)");
        }
        return forge_error.to_exit_code();
    }

    eprintln!("✗ Unexpected error during {operation}: {error:#}");
    ExitCode::INTERNAL
}
