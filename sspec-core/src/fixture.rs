//! A single test fixture.
//!
//! A `Fixture` borrows the fixture store and the compiler adapter for the
//! length of the run. Everything it derives from them is memoized: the
//! compiler runs at most once per fixture and each expectation file is
//! resolved and read at most once. Only a write through the fixture
//! (generate / migrate) clears the expectation caches.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use sspec_adapter::{CompilerAdapter, OutputStyle};
use sspec_fs::FixtureStore;

use crate::error::FixtureError;
use crate::error_text::clean_error;
use crate::expectation::{resolve_kind, ExpectationKind};
use crate::metadata::Metadata;
use crate::normalize::{crlf_to_lf, normalize};
use crate::types::{Check, Verdict};

/// Memoized result of compiling a fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOutput {
    /// Raw stdout with `\r\n` rewritten to `\n`.
    pub stdout: Vec<u8>,
    /// Stdout after the fixture's normalization tier.
    pub normalized: Vec<u8>,
    /// Canonicalized stderr with `\r\n` rewritten to `\n`.
    pub stderr: Vec<u8>,
    pub status: i32,
}

pub struct Fixture<'a, S: FixtureStore, A: CompilerAdapter> {
    dir: PathBuf,
    input_path: PathBuf,
    metadata: Metadata,
    impl_name: String,
    store: &'a S,
    adapter: &'a A,
    paths: [OnceCell<PathBuf>; 3],
    output: OnceCell<CompiledOutput>,
    expected: OnceCell<Option<Vec<u8>>>,
    expected_error: OnceCell<Vec<u8>>,
    expected_status: OnceCell<i32>,
}

impl<'a, S: FixtureStore, A: CompilerAdapter> Fixture<'a, S, A> {
    /// Construct a fixture for `dir`. Fails unless the directory holds
    /// exactly one `input.*` file.
    pub fn new(
        store: &'a S,
        adapter: &'a A,
        dir: &Path,
        metadata: Metadata,
    ) -> Result<Self, FixtureError> {
        let mut inputs = store.list_inputs(dir)?;
        let input_path = match inputs.len() {
            0 => return Err(FixtureError::NoInput(dir.to_path_buf())),
            1 => inputs.remove(0),
            _ => {
                return Err(FixtureError::MultipleInputs {
                    dir: dir.to_path_buf(),
                    inputs,
                })
            }
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            input_path,
            metadata,
            impl_name: adapter.describe(),
            store,
            adapter,
            paths: Default::default(),
            output: OnceCell::new(),
            expected: OnceCell::new(),
            expected_error: OnceCell::new(),
            expected_status: OnceCell::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn impl_name(&self) -> &str {
        &self.impl_name
    }

    pub fn precision(&self) -> u32 {
        self.metadata.precision()
    }

    pub fn output_style(&self) -> Option<OutputStyle> {
        self.metadata.output_style()
    }

    pub fn clean(&self) -> bool {
        self.metadata.clean_output()
    }

    pub fn todo(&self) -> bool {
        self.metadata.todo(&self.impl_name)
    }

    pub fn warning_todo(&self) -> bool {
        self.metadata.warning_todo(&self.impl_name)
    }

    pub fn ignore(&self) -> bool {
        self.metadata.ignore(&self.impl_name)
    }

    pub fn ignore_warning(&self) -> bool {
        self.metadata.ignore_warning(&self.impl_name)
    }

    /// Path to read for `kind`, resolved once per run.
    pub fn expectation_path(&self, kind: ExpectationKind) -> &Path {
        self.paths[kind.index()]
            .get_or_init(|| resolve_kind(self.store, &self.dir, kind, &self.impl_name))
    }

    /// Compile the input, at most once.
    pub fn output(&self) -> Result<&CompiledOutput, FixtureError> {
        if let Some(output) = self.output.get() {
            return Ok(output);
        }

        let raw = self
            .adapter
            .compile(&self.input_path, self.output_style(), self.precision())?;
        let compiled = CompiledOutput {
            normalized: normalize(&raw.stdout, self.clean()),
            stderr: crlf_to_lf(&clean_error(&raw.stderr)),
            stdout: crlf_to_lf(&raw.stdout),
            status: raw.status,
        };

        Ok(self.output.get_or_init(|| compiled))
    }

    /// Normalized expected output, or `None` when no file exists.
    pub fn expected(&self) -> Result<Option<&[u8]>, FixtureError> {
        if let Some(expected) = self.expected.get() {
            return Ok(expected.as_deref());
        }

        let path = self.expectation_path(ExpectationKind::Output);
        let expected = if self.store.is_file(path) {
            Some(normalize(&self.store.read_bytes(path)?, self.clean()))
        } else {
            None
        };

        Ok(self.expected.get_or_init(|| expected).as_deref())
    }

    /// Canonicalized expected error text. Empty when no file exists.
    pub fn expected_error(&self) -> Result<&[u8], FixtureError> {
        if let Some(error) = self.expected_error.get() {
            return Ok(error);
        }

        let path = self.expectation_path(ExpectationKind::Error);
        let error = if self.store.is_file(path) {
            clean_error(&self.store.read_bytes(path)?)
        } else {
            Vec::new()
        };

        Ok(self.expected_error.get_or_init(|| error))
    }

    /// Expected exit status. Zero when no file exists.
    pub fn expected_status(&self) -> Result<i32, FixtureError> {
        if let Some(status) = self.expected_status.get() {
            return Ok(*status);
        }

        let path = self.expectation_path(ExpectationKind::Status);
        let status = if self.store.is_file(path) {
            parse_status(&self.store.read_bytes(path)?)
        } else {
            0
        };

        Ok(*self.expected_status.get_or_init(|| status))
    }

    /// Stderr is compared only when an expected error exists.
    pub fn verify_stderr(&self) -> Result<bool, FixtureError> {
        Ok(!self.expected_error()?.is_empty())
    }

    /// The fixture expects the compiler to exit non-zero.
    pub fn should_fail(&self) -> Result<bool, FixtureError> {
        Ok(self.expected_status()? != 0)
    }

    /// Compare compiled output against the expectations.
    ///
    /// Error fixtures compare status, plus error text when an expected error
    /// exists. Other fixtures compare status and output, plus stderr when
    /// `check_warnings` is set and an expected error exists. A missing expected output compares as
    /// empty.
    pub fn verdict(&self, check_warnings: bool) -> Result<Verdict, FixtureError> {
        let expected_status = self.expected_status()?;
        let actual = self.output()?;

        let status = Check::compare(
            ExpectationKind::Status.base_name(),
            expected_status.to_string().as_bytes(),
            actual.status.to_string().as_bytes(),
        );

        if expected_status != 0 {
            let error = if self.verify_stderr()? {
                Check::compare(
                    ExpectationKind::Error.base_name(),
                    self.expected_error()?,
                    &actual.stderr,
                )
            } else {
                Check::NotChecked
            };
            return Ok(Verdict {
                output: Check::NotChecked,
                error,
                status,
            });
        }

        let output = Check::compare(
            ExpectationKind::Output.base_name(),
            self.expected()?.unwrap_or_default(),
            &actual.normalized,
        );
        let error = if check_warnings && self.verify_stderr()? {
            Check::compare(
                ExpectationKind::Error.base_name(),
                self.expected_error()?,
                &actual.stderr,
            )
        } else {
            Check::NotChecked
        };

        Ok(Verdict {
            output,
            error,
            status,
        })
    }

    /// Write the current stdout to the implementation-qualified expected
    /// output file and drop cached expectations. Returns the written path.
    pub fn write_expected_output(&mut self) -> Result<PathBuf, FixtureError> {
        let stdout = self.output()?.stdout.clone();
        let path = ExpectationKind::Output.qualified_path(&self.dir, &self.impl_name);
        self.store.write_atomic(&path, &stdout)?;
        self.invalidate_expectations();
        Ok(path)
    }

    fn invalidate_expectations(&mut self) {
        for cell in &mut self.paths {
            cell.take();
        }
        self.expected.take();
        self.expected_error.take();
        self.expected_status.take();
    }
}

/// Parse status file contents leniently: optional leading whitespace, an
/// optional sign and digits. Anything else reads as 0.
pub fn parse_status(raw: &[u8]) -> i32 {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end].parse::<i32>().unwrap_or(0);
    if negative {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sspec_adapter::{CompileOutput, MockAdapter};
    use sspec_fs::MockFixtureStore;

    const DIR: &str = "/spec/basic";

    fn store_with_input() -> MockFixtureStore {
        let store = MockFixtureStore::new();
        store.add_file("/spec/basic/input.scss", "a {color: red}");
        store
    }

    fn fixture<'a>(
        store: &'a MockFixtureStore,
        adapter: &'a MockAdapter,
    ) -> Fixture<'a, MockFixtureStore, MockAdapter> {
        let metadata = Metadata::load(store, Path::new(DIR), Path::new("/spec")).unwrap();
        Fixture::new(store, adapter, Path::new(DIR), metadata).unwrap()
    }

    // ===========================================
    // Construction
    // ===========================================

    #[test]
    fn test_new_requires_input() {
        let store = MockFixtureStore::new();
        store.add_file("/spec/basic/expected_output.css", "");
        let adapter = MockAdapter::new("dart-sass");

        let result = Fixture::new(&store, &adapter, Path::new(DIR), Metadata::default());
        assert!(matches!(result, Err(FixtureError::NoInput(_))));
    }

    #[test]
    fn test_new_rejects_multiple_inputs() {
        let store = store_with_input();
        store.add_file("/spec/basic/input.sass", "a\n  color: red");
        let adapter = MockAdapter::new("dart-sass");

        let result = Fixture::new(&store, &adapter, Path::new(DIR), Metadata::default());
        match result {
            Err(FixtureError::MultipleInputs { inputs, .. }) => assert_eq!(inputs.len(), 2),
            _ => panic!("expected MultipleInputs"),
        }
    }

    #[test]
    fn test_new_picks_up_impl_name() {
        let store = store_with_input();
        let adapter = MockAdapter::new("dart-sass");
        let f = fixture(&store, &adapter);
        assert_eq!(f.impl_name(), "dart-sass");
        assert_eq!(f.input_path(), Path::new("/spec/basic/input.scss"));
        assert_eq!(f.name(), "basic");
    }

    // ===========================================
    // Expectation defaults
    // ===========================================

    #[test]
    fn test_missing_status_is_zero() {
        let store = store_with_input();
        let adapter = MockAdapter::new("dart-sass");
        let f = fixture(&store, &adapter);
        assert_eq!(f.expected_status().unwrap(), 0);
        assert!(!f.should_fail().unwrap());
    }

    #[test]
    fn test_missing_error_is_empty() {
        let store = store_with_input();
        let adapter = MockAdapter::new("dart-sass");
        let f = fixture(&store, &adapter);
        assert_eq!(f.expected_error().unwrap(), b"");
        assert!(!f.verify_stderr().unwrap());
    }

    #[test]
    fn test_missing_expected_output_is_none() {
        let store = store_with_input();
        let adapter = MockAdapter::new("dart-sass");
        let f = fixture(&store, &adapter);
        assert_eq!(f.expected().unwrap(), None);
    }

    #[test]
    fn test_qualified_expectations_win() {
        let store = store_with_input();
        store.add_file("/spec/basic/expected_output.css", "base\n");
        store.add_file("/spec/basic/expected_output-dart-sass.css", "qualified\n\n");
        store.add_file("/spec/basic/status", "1\n");
        store.add_file("/spec/basic/status-dart-sass", "65\n");
        store.add_file("/spec/basic/error", "base error");
        store.add_file("/spec/basic/error-dart-sass", "Error: qualified\r\n");
        let adapter = MockAdapter::new("dart-sass");
        let f = fixture(&store, &adapter);

        assert_eq!(f.expected().unwrap(), Some(&b"qualified\n"[..]));
        assert_eq!(f.expected_status().unwrap(), 65);
        assert_eq!(f.expected_error().unwrap(), b"Error: qualified\n");
    }

    #[test]
    fn test_expected_clean_mode() {
        let store = store_with_input();
        store.add_file("/spec/basic/options.yml", ":clean: true\n");
        store.add_file("/spec/basic/expected_output.css", "a,\nb {\n  c: d;\n}\n");
        let adapter = MockAdapter::new("dart-sass");
        let f = fixture(&store, &adapter);

        assert_eq!(f.expected().unwrap(), Some(&b"a,b { c: d; } "[..]));
    }

    // ===========================================
    // Compilation
    // ===========================================

    #[test]
    fn test_output_compiles_once() {
        let store = store_with_input();
        let adapter = MockAdapter::new("dart-sass")
            .with_default(CompileOutput::success("a {\r\n\r\n  color: red;\r\n}\r\n"));
        let f = fixture(&store, &adapter);

        let first = f.output().unwrap().clone();
        let second = f.output().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(adapter.call_count(), 1);
        assert_eq!(first.stdout, b"a {\n\n  color: red;\n}\n");
        assert_eq!(first.normalized, b"a {\n  color: red;\n}\n");
    }

    #[test]
    fn test_output_passes_style_and_precision() {
        let store = store_with_input();
        store.add_file(
            "/spec/basic/options.yml",
            ":output_style: compressed\n:precision: 10\n",
        );
        let adapter = MockAdapter::new("dart-sass");
        let f = fixture(&store, &adapter);
        f.output().unwrap();

        let calls = adapter.calls();
        assert_eq!(calls[0].style, Some(OutputStyle::Compressed));
        assert_eq!(calls[0].precision, 10);
        assert_eq!(calls[0].input, PathBuf::from("/spec/basic/input.scss"));
    }

    #[test]
    fn test_output_cleans_stderr() {
        let store = store_with_input();
        let adapter = MockAdapter::new("dart-sass").with_default(CompileOutput::failure(
            "Error: bad\r\n  /home/me/sass-spec/spec/basic/input.scss 1:1\r\n\r\n",
            65,
        ));
        let f = fixture(&store, &adapter);

        let out = f.output().unwrap();
        assert_eq!(out.stderr, b"Error: bad\n  /sass/spec/basic/input.scss 1:1\n");
        assert_eq!(out.status, 65);
    }

    // ===========================================
    // Verdicts
    // ===========================================

    #[test]
    fn test_verdict_pass() {
        let store = store_with_input();
        store.add_file("/spec/basic/expected_output.css", "a{color:red}\n");
        let adapter =
            MockAdapter::new("dart-sass").with_default(CompileOutput::success("a{color:red}\n"));
        let f = fixture(&store, &adapter);

        let verdict = f.verdict(true).unwrap();
        assert!(verdict.passed());
        assert_eq!(verdict.error, Check::NotChecked);
    }

    #[test]
    fn test_verdict_output_mismatch() {
        let store = store_with_input();
        store.add_file("/spec/basic/expected_output.css", "a{color:red}\n");
        let adapter =
            MockAdapter::new("dart-sass").with_default(CompileOutput::success("a{color:blue}\n"));
        let f = fixture(&store, &adapter);

        let verdict = f.verdict(true).unwrap();
        assert!(!verdict.passed());
        assert!(verdict.output.is_mismatch());
    }

    #[test]
    fn test_verdict_error_fixture_skips_output() {
        let store = store_with_input();
        store.add_file("/spec/basic/status", "1\n");
        store.add_file("/spec/basic/error", "Error: bad\n");
        let adapter = MockAdapter::new("dart-sass")
            .with_default(CompileOutput::failure("Error: bad", 1).with_stderr("Error: bad"));
        let f = fixture(&store, &adapter);

        let verdict = f.verdict(false).unwrap();
        assert_eq!(verdict.output, Check::NotChecked);
        assert_eq!(verdict.error, Check::Match);
        assert_eq!(verdict.status, Check::Match);
    }

    #[test]
    fn test_verdict_error_fixture_without_error_file() {
        let store = store_with_input();
        store.add_file("/spec/basic/status", "1\n");
        let adapter =
            MockAdapter::new("dart-sass").with_default(CompileOutput::failure("Error: nope\n", 1));
        let f = fixture(&store, &adapter);

        let verdict = f.verdict(true).unwrap();
        assert!(verdict.passed());
        assert_eq!(verdict.error, Check::NotChecked);
        assert_eq!(verdict.status, Check::Match);
    }

    #[test]
    fn test_verdict_status_mismatch() {
        let store = store_with_input();
        store.add_file("/spec/basic/expected_output.css", "");
        let adapter =
            MockAdapter::new("dart-sass").with_default(CompileOutput::failure("Error: x", 1));
        let f = fixture(&store, &adapter);

        let verdict = f.verdict(true).unwrap();
        assert!(verdict.status.is_mismatch());
    }

    #[test]
    fn test_verdict_warnings_checked_only_when_expected() {
        let store = store_with_input();
        store.add_file("/spec/basic/expected_output.css", "a{}\n");
        let adapter = MockAdapter::new("dart-sass")
            .with_default(CompileOutput::success("a{}\n").with_stderr("WARNING: deprecated\n"));
        let f = fixture(&store, &adapter);

        // no expected error: stderr is not compared
        assert!(f.verdict(true).unwrap().passed());
    }

    #[test]
    fn test_verdict_warning_mismatch() {
        let store = store_with_input();
        store.add_file("/spec/basic/expected_output.css", "a{}\n");
        store.add_file("/spec/basic/error", "WARNING: old message\n");
        let adapter = MockAdapter::new("dart-sass")
            .with_default(CompileOutput::success("a{}\n").with_stderr("WARNING: new message\n"));
        let f = fixture(&store, &adapter);

        assert!(f.verdict(true).unwrap().warning_only());
        assert!(f.verdict(false).unwrap().passed());
    }

    // ===========================================
    // Writes
    // ===========================================

    #[test]
    fn test_write_expected_output_invalidates_cache() {
        let store = store_with_input();
        store.add_file("/spec/basic/expected_output.css", "old\n");
        let adapter = MockAdapter::new("dart-sass").with_default(CompileOutput::success("new\r\n"));
        let mut f = fixture(&store, &adapter);

        assert_eq!(f.expected().unwrap(), Some(&b"old\n"[..]));
        let written = f.write_expected_output().unwrap();

        assert_eq!(
            written,
            PathBuf::from("/spec/basic/expected_output-dart-sass.css")
        );
        assert_eq!(store.get_file(&written).unwrap(), b"new\n");
        assert_eq!(f.expectation_path(ExpectationKind::Output), written.as_path());
        assert_eq!(f.expected().unwrap(), Some(&b"new\n"[..]));
        assert_eq!(adapter.call_count(), 1);
    }

    // ===========================================
    // Status parsing
    // ===========================================

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(b"65\n"), 65);
        assert_eq!(parse_status(b"  1"), 1);
        assert_eq!(parse_status(b"-2"), -2);
        assert_eq!(parse_status(b"+3"), 3);
        assert_eq!(parse_status(b"12abc"), 12);
        assert_eq!(parse_status(b"abc"), 0);
        assert_eq!(parse_status(b""), 0);
    }
}
