//! Exit code constants for pageforge.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Page generated and written |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `SINK_FAILURE` | Artifact could not be persisted |
//! | 10 | `STAGE_TIMEOUT` | A stage's last attempt timed out |
//! | 70 | `GENERATION_FAILURE` | Generation service kept failing |

use crate::error::ForgeError;

/// Exit codes matching the documented exit code table.
///
/// Use the named constants for common exit codes, or [`as_i32()`](Self::as_i32)
/// to get the numeric value for `std::process::exit()`.
///
/// ```rust
/// use pageforge_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::GENERATION_FAILURE, ExitCode::from_i32(70));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - page generated and handed to the sink
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments, goal or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Sink failure - the finished page could not be written
    pub const SINK_FAILURE: ExitCode = ExitCode(3);

    /// Stage timeout - the final attempt of a stage exceeded its timeout
    pub const STAGE_TIMEOUT: ExitCode = ExitCode(10);

    /// Generation failure - the generation service kept failing
    pub const GENERATION_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
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

impl From<&ForgeError> for ExitCode {
    fn from(err: &ForgeError) -> Self {
        err.to_exit_code()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_exit_code_values_are_stable() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::SINK_FAILURE.as_i32(), 3);
        assert_eq!(ExitCode::STAGE_TIMEOUT.as_i32(), 10);
        assert_eq!(ExitCode::GENERATION_FAILURE.as_i32(), 70);
    }

    #[test]
    fn test_from_error_reference() {
        let err = ForgeError::Config(ConfigError::InvalidFile("bad".to_string()));
        assert_eq!(ExitCode::from(&err), ExitCode::CLI_ARGS);
        let raw: i32 = ExitCode::from(&err).into();
        assert_eq!(raw, 2);
    }
}
