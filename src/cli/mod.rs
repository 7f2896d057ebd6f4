//! CLI module for sermon-auto
//!
//! - `args`: clap argument definitions
//! - `commands`: one handler per subcommand
//! - `prompt`: interactive questions on stdin/stderr
//! - `run`: entry point and dispatch

pub mod args;
mod commands;
mod prompt;
mod run;

pub use args::{Cli, Commands, ExportFormat, RunArgs};
pub use run::run;
