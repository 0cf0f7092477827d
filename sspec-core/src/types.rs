//! Comparison and run result types.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Why a discovered fixture did not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Metadata excludes the target language version.
    Version,
    /// Metadata excludes the target implementation.
    Implementation,
    /// Input path does not contain the filter substring.
    Filter,
    /// Output style is not in the allow-list.
    OutputStyle,
}

/// A fixture excluded during selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skip {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// A diff between expected and actual content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDiff {
    pub file: String,
    pub expected_len: usize,
    pub actual_len: usize,
    pub first_diff_line: Option<usize>,
    pub expected_excerpt: Option<String>,
    pub actual_excerpt: Option<String>,
}

impl FileDiff {
    /// Create a diff, or `None` when the contents are identical.
    pub fn new(file: &str, expected: &[u8], actual: &[u8]) -> Option<Self> {
        if expected == actual {
            return None;
        }

        let expected_text = String::from_utf8_lossy(expected);
        let actual_text = String::from_utf8_lossy(actual);
        let expected_lines: Vec<&str> = expected_text.lines().collect();
        let actual_lines: Vec<&str> = actual_text.lines().collect();

        let mut first_diff_line = None;
        let mut expected_excerpt = None;
        let mut actual_excerpt = None;

        for (i, (e, a)) in expected_lines.iter().zip(actual_lines.iter()).enumerate() {
            if e != a {
                first_diff_line = Some(i + 1);
                expected_excerpt = Some(e.to_string());
                actual_excerpt = Some(a.to_string());
                break;
            }
        }

        if first_diff_line.is_none() && expected_lines.len() != actual_lines.len() {
            let line = expected_lines.len().min(actual_lines.len()) + 1;
            first_diff_line = Some(line);
            expected_excerpt = expected_lines.get(line - 1).map(|s| s.to_string());
            actual_excerpt = actual_lines.get(line - 1).map(|s| s.to_string());
        }

        Some(Self {
            file: file.to_string(),
            expected_len: expected.len(),
            actual_len: actual.len(),
            first_diff_line,
            expected_excerpt,
            actual_excerpt,
        })
    }
}

/// Result of one comparison within a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    NotChecked,
    Match,
    Mismatch(FileDiff),
}

impl Check {
    pub fn compare(file: &str, expected: &[u8], actual: &[u8]) -> Self {
        match FileDiff::new(file, expected, actual) {
            Some(diff) => Check::Mismatch(diff),
            None => Check::Match,
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, Check::Mismatch(_))
    }

    fn diff(&self) -> Option<&FileDiff> {
        match self {
            Check::Mismatch(diff) => Some(diff),
            _ => None,
        }
    }
}

/// Outcome of comparing a fixture's compiled output against its expectations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub output: Check,
    pub error: Check,
    pub status: Check,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        !self.output.is_mismatch() && !self.error.is_mismatch() && !self.status.is_mismatch()
    }

    /// The only mismatch is in the warning (stderr) text.
    pub fn warning_only(&self) -> bool {
        self.error.is_mismatch() && !self.output.is_mismatch() && !self.status.is_mismatch()
    }

    pub fn diffs(&self) -> Vec<FileDiff> {
        [&self.output, &self.error, &self.status]
            .into_iter()
            .filter_map(Check::diff)
            .cloned()
            .collect()
    }
}

/// Final classification of one fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    /// Marked todo and passed. Candidate for promotion out of todo.
    TodoPassed,
    /// Marked todo (or warning-todo) and still failing.
    TodoFailed,
    /// Ignored for the implementation; not compiled.
    Ignored,
    /// No expected output on disk in verify mode; not compared.
    MissingExpectation,
    /// Expected output written in generate mode.
    Generated,
    /// Expected output rewritten for the implementation after a mismatch.
    Migrated,
    /// Fixture structure, store or compiler error.
    Errored(String),
}

/// Report for one fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixtureReport {
    pub path: PathBuf,
    pub name: String,
    pub outcome: Outcome,
    /// Counts against the run's success.
    pub fatal: bool,
    pub diffs: Vec<FileDiff>,
}

impl FixtureReport {
    pub fn new(path: &Path, name: &str, outcome: Outcome, fatal: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            name: name.to_string(),
            outcome,
            fatal,
            diffs: Vec::new(),
        }
    }

    pub fn with_diffs(mut self, diffs: Vec<FileDiff>) -> Self {
        self.diffs = diffs;
        self
    }
}

/// Aggregate result of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub implementation: String,
    pub language_version: String,
    pub reports: Vec<FixtureReport>,
    pub skipped: Vec<Skip>,
}

impl RunSummary {
    pub fn new(implementation: &str, language_version: &str) -> Self {
        Self {
            implementation: implementation.to_string(),
            language_version: language_version.to_string(),
            ..Self::default()
        }
    }

    /// True when no fixture report is fatal.
    pub fn success(&self) -> bool {
        !self.reports.iter().any(|r| r.fatal)
    }

    pub fn count(&self, outcome: &Outcome) -> usize {
        self.reports.iter().filter(|r| &r.outcome == outcome).count()
    }

    pub fn errored(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Errored(_)))
            .count()
    }

    pub fn fatal_reports(&self) -> impl Iterator<Item = &FixtureReport> {
        self.reports.iter().filter(|r| r.fatal)
    }

    /// Fixtures marked `todo` that now pass. Passing `warning_todo`
    /// fixtures report as plain passes and are not listed.
    pub fn todo_passing(&self) -> Vec<&Path> {
        self.reports
            .iter()
            .filter(|r| r.outcome == Outcome::TodoPassed)
            .map(|r| r.path.as_path())
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
