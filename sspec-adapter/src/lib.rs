//! Compiler adapter abstraction for the sass-spec harness.
//!
//! The harness never compiles anything itself. It hands an input path, an
//! output style and a numeric precision to a `CompilerAdapter` and consumes
//! the `(stdout, stderr, status)` triple it returns. A real implementation
//! spawning an executable and a mock implementation for tests are provided.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised at the adapter boundary.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} was terminated by a signal")]
    Terminated { program: String },
}

/// Error returned when an output style name is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown output style: {0} (expected nested, expanded, compact or compressed)")]
pub struct UnknownOutputStyle(pub String);

/// Render mode requested from the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    Nested,
    Expanded,
    Compact,
    Compressed,
}

impl OutputStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStyle::Nested => "nested",
            OutputStyle::Expanded => "expanded",
            OutputStyle::Compact => "compact",
            OutputStyle::Compressed => "compressed",
        }
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputStyle {
    type Err = UnknownOutputStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nested" => Ok(OutputStyle::Nested),
            "expanded" => Ok(OutputStyle::Expanded),
            "compact" => Ok(OutputStyle::Compact),
            "compressed" => Ok(OutputStyle::Compressed),
            _ => Err(UnknownOutputStyle(s.to_string())),
        }
    }
}

/// Raw result of one compiler invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: i32,
}

impl CompileOutput {
    /// Successful compilation producing `stdout`.
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: Vec::new(),
            status: 0,
        }
    }

    /// Failed compilation with an error message and exit status.
    pub fn failure(stderr: impl Into<Vec<u8>>, status: i32) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into(),
            status,
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<Vec<u8>>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

/// Trait for the compiler under test.
pub trait CompilerAdapter: Send + Sync {
    /// Compile `input` and return the raw output triple.
    fn compile(
        &self,
        input: &Path,
        style: Option<OutputStyle>,
        precision: u32,
    ) -> Result<CompileOutput, AdapterError>;

    /// Identity string of the implementation.
    /// Used as `<impl>` in qualified expectation file names.
    fn describe(&self) -> String;

    /// Human readable version banner.
    fn version(&self) -> String;

    /// Language version the implementation supports, if it knows.
    fn language_version(&self) -> Option<String> {
        None
    }
}

/// Adapter that runs a compiler executable.
///
/// Invocation: `<program> [args..] [--style <style>] --precision <n> <input>`.
#[derive(Debug, Clone)]
pub struct CommandAdapter {
    program: PathBuf,
    args: Vec<String>,
    name: String,
    language_version: Option<String>,
}

impl CommandAdapter {
    /// Create an adapter for `program`. The implementation name defaults to
    /// the program's file stem.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "sass".to_string());
        Self {
            program,
            args: Vec::new(),
            name,
            language_version: None,
        }
    }

    /// Extra arguments placed before the harness-supplied ones.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_language_version(mut self, version: impl Into<String>) -> Self {
        self.language_version = Some(version.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Build the command line for one compilation.
    pub fn build_command(
        &self,
        input: &Path,
        style: Option<OutputStyle>,
        precision: u32,
    ) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(style) = style {
            cmd.arg("--style").arg(style.as_str());
        }
        cmd.arg("--precision").arg(precision.to_string());
        cmd.arg(input);
        cmd
    }
}

impl CompilerAdapter for CommandAdapter {
    fn compile(
        &self,
        input: &Path,
        style: Option<OutputStyle>,
        precision: u32,
    ) -> Result<CompileOutput, AdapterError> {
        let output = self
            .build_command(input, style, precision)
            .output()
            .map_err(|source| AdapterError::Spawn {
                program: self.program_name(),
                source,
            })?;

        let status = output.status.code().ok_or_else(|| AdapterError::Terminated {
            program: self.program_name(),
        })?;

        Ok(CompileOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            status,
        })
    }

    fn describe(&self) -> String {
        self.name.clone()
    }

    fn version(&self) -> String {
        Command::new(&self.program)
            .args(&self.args)
            .arg("--version")
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format!("{} (version unknown)", self.name))
    }

    fn language_version(&self) -> Option<String> {
        self.language_version.clone()
    }
}

/// A recorded call to `MockAdapter::compile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCall {
    pub input: PathBuf,
    pub style: Option<OutputStyle>,
    pub precision: u32,
}

/// Mock adapter for testing.
///
/// Returns a canned output per input path (or a default) and records every
/// call so tests can assert how often the compiler was invoked.
#[derive(Debug, Default)]
pub struct MockAdapter {
    name: String,
    language_version: Option<String>,
    default_output: CompileOutput,
    outputs: HashMap<PathBuf, CompileOutput>,
    calls: RwLock<Vec<CompileCall>>,
    count: AtomicUsize,
}

impl MockAdapter {
    /// Create a mock adapter identifying itself as `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Output returned for inputs without a specific entry.
    pub fn with_default(mut self, output: CompileOutput) -> Self {
        self.default_output = output;
        self
    }

    /// Output returned for a specific input path.
    pub fn with_output(mut self, input: impl Into<PathBuf>, output: CompileOutput) -> Self {
        self.outputs.insert(input.into(), output);
        self
    }

    pub fn with_language_version(mut self, version: impl Into<String>) -> Self {
        self.language_version = Some(version.into());
        self
    }

    /// Number of compile calls made so far.
    pub fn call_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// All compile calls made so far.
    pub fn calls(&self) -> Vec<CompileCall> {
        self.calls.read().unwrap().clone()
    }
}

impl CompilerAdapter for MockAdapter {
    fn compile(
        &self,
        input: &Path,
        style: Option<OutputStyle>,
        precision: u32,
    ) -> Result<CompileOutput, AdapterError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.calls.write().unwrap().push(CompileCall {
            input: input.to_path_buf(),
            style,
            precision,
        });
        Ok(self
            .outputs
            .get(input)
            .cloned()
            .unwrap_or_else(|| self.default_output.clone()))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }

    fn version(&self) -> String {
        format!("{} (mock)", self.name)
    }

    fn language_version(&self) -> Option<String> {
        self.language_version.clone()
    }
}
