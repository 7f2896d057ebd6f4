//! Configuration management for sermon-auto
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > environment > file > defaults. Configuration files are TOML with
//! `[llm]`, `[retry]`, `[paths]` and `[history]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use model::*;
pub use sermon_utils::types::ConfigSource;
