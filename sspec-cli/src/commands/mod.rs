//! Command orchestration for the sass-spec binary.

pub mod run;

pub use run::{build_adapter, execute_run, RunResult};

use crate::cli::CliError;
use sspec_core::ConfigError;
use sspec_fs::FsError;
use thiserror::Error;

/// Errors from command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;
