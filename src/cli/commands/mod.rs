//! CLI command implementations, one module per subcommand.

mod config;
mod feedback;
mod history;
mod run;

pub(crate) use config::execute_config_command;
pub(crate) use feedback::execute_feedback_command;
pub(crate) use history::execute_history_command;
pub(crate) use run::execute_run_command;
