//! sass-spec CLI.
//!
//! Argument parsing, run orchestration, exit codes and summary output for
//! the `sass-spec` binary.

pub mod cli;
pub mod commands;
pub mod exit;
pub mod output;

pub use cli::{parse_from, Cli, CliError, RunArgs, DEFAULT_SPEC_ROOT};
pub use commands::{build_adapter, execute_run, CommandError, CommandResult, RunResult};
pub use output::write_summary;
