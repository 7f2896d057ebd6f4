//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use sermon_utils::logging::init_tracing;

use super::args::{Cli, Commands};
use super::commands;
use crate::{CliArgs, Config, ExitCode, SermonError};

/// Main CLI execution function.
///
/// Prints everything itself, errors included, and returns the exit code to
/// use on failure. main.rs only calls `std::process::exit`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("warning: logging disabled: {e}");
    }

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        model: cli.model.clone(),
        output_dir: cli.output_dir.clone(),
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            let err = SermonError::from(err);
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
            Commands::Run(args) => commands::execute_run_command(&args, &config).await,
            Commands::Feedback { date } => commands::execute_feedback_command(&date, &config),
            Commands::History { limit } => commands::execute_history_command(limit, &config),
            Commands::Config => commands::execute_config_command(&config),
        }
    });

    result.map_err(|err| {
        tracing::debug!(error = ?err, "Command failed");
        eprintln!("{}", err.display_for_user());
        err.to_exit_code()
    })
}
