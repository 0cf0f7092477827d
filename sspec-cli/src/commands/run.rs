//! Run command orchestration.
//!
//! Resolves the language version, selects fixtures, runs them and writes
//! the optional JSON summary.

use sspec_adapter::{CommandAdapter, CompilerAdapter};
use sspec_core::{resolve_language_version, select, Logger, RunSummary, Runner};
use sspec_fs::FixtureStore;

use crate::cli::{CliError, RunArgs};

use super::CommandResult;

/// Result of run command execution.
#[derive(Debug)]
pub struct RunResult {
    pub summary: RunSummary,
    /// Version banner reported by the compiler.
    pub compiler_version: String,
}

/// Build the compiler adapter described by the arguments.
pub fn build_adapter(args: &RunArgs) -> CommandAdapter {
    let adapter = CommandAdapter::new(&args.command).with_args(args.command_args.clone());
    match &args.impl_name {
        Some(name) => adapter.with_name(name.trim()),
        None => adapter,
    }
}

/// Execute a suite run.
pub fn execute_run<S, A>(
    args: &RunArgs,
    store: &S,
    adapter: &A,
    logger: &dyn Logger,
) -> CommandResult<RunResult>
where
    S: FixtureStore,
    A: CompilerAdapter,
{
    args.validate()?;

    if !store.is_dir(&args.spec_root) {
        return Err(CliError::MissingSpecRoot(args.spec_root.display().to_string()).into());
    }

    let language_version =
        resolve_language_version(args.language_version.as_deref(), adapter, logger)?;
    let config = args.to_config(language_version);

    let dirs: Vec<String> = config.dirs.iter().map(|d| d.display().to_string()).collect();
    logger.info(&format!(
        "Recursively searching under {} for test files to test '{}' against language version {}.",
        dirs.join(", "),
        adapter.describe(),
        config.language_version
    ));
    let compiler_version = adapter.version();
    logger.info(&compiler_version);

    let selection = select(store, adapter, &config, logger)?;
    let summary = Runner::new(&config, logger).run(selection);

    if let Some(path) = &args.report_json {
        let json = summary.to_json()?;
        store.write_atomic(path, json.as_bytes())?;
        logger.verbose(&format!("wrote report to {}", path.display()));
    }

    Ok(RunResult {
        summary,
        compiler_version,
    })
}
