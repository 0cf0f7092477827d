//! CLI argument parsing for sass-spec.

use std::path::PathBuf;

use clap::Parser;
use semver::Version;
use sspec_adapter::OutputStyle;
use sspec_core::{RunConfig, TodoMode};
use thiserror::Error;

/// Default root of the fixture tree.
pub const DEFAULT_SPEC_ROOT: &str = "spec";

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("--probe-todo and --strict-todo cannot be combined")]
    ConflictingTodoModes,

    #[error("--generate and --migrate-impl cannot be combined")]
    ConflictingWriteModes,

    #[error("--impl must not be empty")]
    EmptyImplName,

    #[error("spec root does not exist: {0}")]
    MissingSpecRoot(String),
}

/// sass-spec - run the Sass conformance suite against a compiler.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "sass-spec")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
}

/// Arguments for a suite run.
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Directories (or files inside fixtures) to run. Defaults to the spec root.
    pub dirs: Vec<PathBuf>,

    /// Compiler executable to test.
    #[arg(short, long)]
    pub command: PathBuf,

    /// Extra argument passed to the compiler before the harness arguments.
    /// May be repeated.
    #[arg(long = "command-arg", allow_hyphen_values = true)]
    pub command_args: Vec<String>,

    /// Implementation name used for todo lists and qualified expectations.
    /// Defaults to the compiler's file name.
    #[arg(long = "impl")]
    pub impl_name: Option<String>,

    /// Language version to test against (e.g. 3.5).
    #[arg(long)]
    pub language_version: Option<String>,

    /// Only run fixtures whose input path contains this string.
    #[arg(long, default_value = "")]
    pub filter: String,

    /// Only run fixtures that declare this output style. May be repeated.
    #[arg(long = "output-style")]
    pub output_styles: Vec<OutputStyle>,

    /// Root of the fixture tree; options.yml inheritance stops here.
    #[arg(long, default_value = DEFAULT_SPEC_ROOT)]
    pub spec_root: PathBuf,

    /// Increase verbosity (-v skips, -vv per-fixture progress).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Check todo and warning-todo fixtures fully without failing the run.
    #[arg(long)]
    pub probe_todo: bool,

    /// Fail the run when a todo fixture still fails.
    #[arg(long)]
    pub strict_todo: bool,

    /// Write the compiler's output as the implementation's expected output.
    #[arg(long)]
    pub generate: bool,

    /// Write implementation expected output for fixtures whose output differs.
    #[arg(long)]
    pub migrate_impl: bool,

    /// Write the run summary as JSON to this path.
    #[arg(long)]
    pub report_json: Option<PathBuf>,
}

impl RunArgs {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.probe_todo && self.strict_todo {
            return Err(CliError::ConflictingTodoModes);
        }
        if self.generate && self.migrate_impl {
            return Err(CliError::ConflictingWriteModes);
        }
        if let Some(name) = &self.impl_name {
            if name.trim().is_empty() {
                return Err(CliError::EmptyImplName);
            }
        }
        Ok(())
    }

    pub fn todo_mode(&self) -> TodoMode {
        if self.probe_todo {
            TodoMode::Probe
        } else if self.strict_todo {
            TodoMode::Strict
        } else {
            TodoMode::Informational
        }
    }

    /// Build the run configuration for a resolved language version.
    pub fn to_config(&self, language_version: Version) -> RunConfig {
        RunConfig::new(&self.spec_root)
            .with_dirs(self.dirs.clone())
            .with_language_version(language_version)
            .with_filter(self.filter.clone())
            .with_output_styles(self.output_styles.clone())
            .with_todo_mode(self.todo_mode())
            .with_generate(self.generate)
            .with_migrate_impl(self.migrate_impl)
    }
}

/// Parse CLI arguments from an iterator (for testing).
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}
