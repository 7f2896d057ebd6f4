//! Exit code constants for sermon-auto.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | Persistence, export or other internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments, configuration or run request |
//! | 70 | `GENERATION_FAILURE` | A pipeline stage failed to generate |

/// Exit codes matching the documented exit code table.
///
/// # Example
///
/// ```rust
/// use sermon_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::GENERATION_FAILURE.as_i32(), 70);
/// assert_eq!(ExitCode::from_i32(2), ExitCode::CLI_ARGS);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - persistence, export or unexpected failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments, configuration or run request
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Generation failure - a stage failed after retries or on a fatal fault
    pub const GENERATION_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values_are_stable() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::GENERATION_FAILURE.as_i32(), 70);
    }

    #[test]
    fn test_conversions() {
        let code: ExitCode = 70.into();
        assert_eq!(code, ExitCode::GENERATION_FAILURE);
        assert_eq!(i32::from(ExitCode::CLI_ARGS), 2);
    }
}
