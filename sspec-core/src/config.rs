//! Run configuration.

use std::path::PathBuf;

use semver::Version;
use serde::Serialize;
use sspec_adapter::{CompilerAdapter, OutputStyle};

use crate::error::ConfigError;
use crate::logger::Logger;

/// Language version assumed when neither the run nor the adapter names one.
pub const MAX_LANGUAGE_VERSION: &str = "4.0";

/// How fixtures marked todo affect the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoMode {
    /// Todo fixtures run; failures are expected and passes are collected.
    #[default]
    Informational,
    /// Todo fixtures that still fail fail the run.
    Strict,
    /// Todo and warning-todo fixtures run with full checking; their outcome
    /// never changes the run's success.
    Probe,
}

/// Configuration for one harness run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root of the fixture tree. `options.yml` inheritance stops here.
    pub spec_root: PathBuf,
    /// Directories (or files inside fixtures) to search for fixtures.
    pub dirs: Vec<PathBuf>,
    pub language_version: Version,
    /// Substring the input path must contain. Empty matches everything.
    pub filter: String,
    /// When non-empty, only fixtures declaring one of these styles run.
    pub output_styles: Vec<OutputStyle>,
    pub todo_mode: TodoMode,
    /// Overwrite qualified expected output instead of comparing.
    pub generate: bool,
    /// Write qualified expected output for fixtures whose output mismatches.
    pub migrate_impl: bool,
}

impl RunConfig {
    /// Configuration searching the whole tree at `spec_root`.
    pub fn new(spec_root: impl Into<PathBuf>) -> Self {
        let spec_root = spec_root.into();
        Self {
            dirs: vec![spec_root.clone()],
            spec_root,
            language_version: default_language_version(),
            filter: String::new(),
            output_styles: Vec::new(),
            todo_mode: TodoMode::default(),
            generate: false,
            migrate_impl: false,
        }
    }

    pub fn with_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        if !dirs.is_empty() {
            self.dirs = dirs;
        }
        self
    }

    pub fn with_language_version(mut self, version: Version) -> Self {
        self.language_version = version;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_output_styles(mut self, styles: Vec<OutputStyle>) -> Self {
        self.output_styles = styles;
        self
    }

    pub fn with_todo_mode(mut self, mode: TodoMode) -> Self {
        self.todo_mode = mode;
        self
    }

    pub fn with_generate(mut self, generate: bool) -> Self {
        self.generate = generate;
        self
    }

    pub fn with_migrate_impl(mut self, migrate_impl: bool) -> Self {
        self.migrate_impl = migrate_impl;
        self
    }
}

/// Parse a language version, accepting short forms like `3.5` or `4`.
pub fn coerce_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim().trim_start_matches('v');
    if let Ok(version) = Version::parse(trimmed) {
        return Some(version);
    }

    let parts: Vec<&str> = trimmed.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.parse::<u64>().is_err()) {
        return None;
    }

    let mut padded = parts.clone();
    while padded.len() < 3 {
        padded.push("0");
    }
    Version::parse(&padded.join(".")).ok()
}

fn default_language_version() -> Version {
    coerce_version(MAX_LANGUAGE_VERSION).unwrap_or_else(|| Version::new(4, 0, 0))
}

/// Decide the language version for a run: an explicit override first, then
/// whatever the adapter reports, then `MAX_LANGUAGE_VERSION` with a warning.
pub fn resolve_language_version<A>(
    requested: Option<&str>,
    adapter: &A,
    logger: &dyn Logger,
) -> Result<Version, ConfigError>
where
    A: CompilerAdapter + ?Sized,
{
    let raw = match requested {
        Some(raw) => raw.to_string(),
        None => match adapter.language_version() {
            Some(raw) => raw,
            None => {
                logger.warn(&format!(
                    "No language version specified. Using {}",
                    MAX_LANGUAGE_VERSION
                ));
                return Ok(default_language_version());
            }
        },
    };

    coerce_version(&raw).ok_or(ConfigError::InvalidLanguageVersion(raw))
}
