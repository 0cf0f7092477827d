//! Exit codes for the sass-spec CLI.

use sspec_core::RunSummary;

use crate::commands::CommandError;

/// Exit code constants.
pub mod codes {
    /// Every fixture passed or was tolerated.
    pub const SUCCESS: i32 = 0;
    /// At least one fixture failed or errored.
    pub const TEST_FAILURES: i32 = 1;
    /// Invalid arguments or configuration.
    pub const INVALID_ARGS: i32 = 2;
    /// IO error.
    pub const IO_ERROR: i32 = 3;
}

/// Map a CommandError to an exit code.
pub fn exit_code(error: &CommandError) -> i32 {
    match error {
        CommandError::InvalidArgument(_) => codes::INVALID_ARGS,
        CommandError::Config(_) => codes::INVALID_ARGS,
        CommandError::Filesystem(_) => codes::IO_ERROR,
        CommandError::Encode(_) => codes::IO_ERROR,
    }
}

/// Exit code for a completed run.
pub fn summary_exit_code(summary: &RunSummary) -> i32 {
    if summary.success() {
        codes::SUCCESS
    } else {
        codes::TEST_FAILURES
    }
}
