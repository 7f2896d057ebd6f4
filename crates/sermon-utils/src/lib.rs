pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod progress;
pub mod redaction;
pub mod types;
