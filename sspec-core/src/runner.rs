//! Run loop.
//!
//! Each selected fixture is classified into exactly one `Outcome`:
//!
//! 1. Ignored for the implementation: not compiled.
//! 2. Generate mode: current output is written as the implementation's
//!    expected output.
//! 3. No expected output and no expected failure: reported, not compared.
//! 4. Otherwise compiled and compared. A mismatch may be migrated, tolerated
//!    as todo, or fail the run depending on the configuration.

use sspec_adapter::CompilerAdapter;
use sspec_fs::FixtureStore;

use crate::config::{RunConfig, TodoMode};
use crate::error::FixtureError;
use crate::fixture::Fixture;
use crate::logger::Logger;
use crate::select::Selection;
use crate::types::{FixtureReport, Outcome, RunSummary};

pub struct Runner<'c> {
    config: &'c RunConfig,
    logger: &'c dyn Logger,
}

impl<'c> Runner<'c> {
    pub fn new(config: &'c RunConfig, logger: &'c dyn Logger) -> Self {
        Self { config, logger }
    }

    /// Run every selected fixture. Broken fixtures found during selection
    /// are reported as errored. Reports are ordered by fixture path.
    pub fn run<S, A>(&self, selection: Selection<'_, S, A>) -> RunSummary
    where
        S: FixtureStore,
        A: CompilerAdapter,
    {
        let mut summary = RunSummary::new(
            &selection.implementation,
            &self.config.language_version.to_string(),
        );
        summary.skipped = selection.skipped;

        for broken in selection.errors {
            self.logger
                .warn(&format!("{}: {}", broken.name, broken.error));
            summary.reports.push(FixtureReport::new(
                &broken.dir,
                &broken.name,
                Outcome::Errored(broken.error.to_string()),
                true,
            ));
        }

        for mut fixture in selection.fixtures {
            summary.reports.push(self.run_fixture(&mut fixture));
        }

        summary.reports.sort_by(|a, b| a.path.cmp(&b.path));
        summary
    }

    /// Run a single fixture. Compiler and store failures become an
    /// `Errored` report.
    pub fn run_fixture<S, A>(&self, fixture: &mut Fixture<'_, S, A>) -> FixtureReport
    where
        S: FixtureStore,
        A: CompilerAdapter,
    {
        self.logger.debug(&format!("running {}", fixture.name()));

        match self.classify(fixture) {
            Ok(report) => report,
            Err(err) => {
                self.logger.warn(&format!("{}: {}", fixture.name(), err));
                FixtureReport::new(
                    fixture.dir(),
                    fixture.name(),
                    Outcome::Errored(err.to_string()),
                    true,
                )
            }
        }
    }

    fn classify<S, A>(&self, fixture: &mut Fixture<'_, S, A>) -> Result<FixtureReport, FixtureError>
    where
        S: FixtureStore,
        A: CompilerAdapter,
    {
        // Selection already drops `ignore_for` fixtures; this covers fixtures
        // handed straight to `run_fixture`.
        if fixture.ignore() {
            self.logger.debug(&format!(
                "{} is ignored for {}",
                fixture.name(),
                fixture.impl_name()
            ));
            return Ok(report(fixture, Outcome::Ignored, false));
        }

        if self.config.generate {
            let path = fixture.write_expected_output()?;
            self.logger.verbose(&format!("wrote {}", path.display()));
            return Ok(report(fixture, Outcome::Generated, false));
        }

        if !fixture.should_fail()? && fixture.expected()?.is_none() {
            self.logger.warn(&format!(
                "Expected output file missing for {}. Skipping.",
                fixture.name()
            ));
            return Ok(report(fixture, Outcome::MissingExpectation, false));
        }

        let check_warnings = !fixture.ignore_warning();
        let mut verdict = fixture.verdict(check_warnings)?;

        if !verdict.passed() && self.config.migrate_impl && verdict.output.is_mismatch() {
            let path = fixture.write_expected_output()?;
            self.logger.verbose(&format!("migrated {} to {}", fixture.name(), path.display()));
            verdict = fixture.verdict(check_warnings)?;
            if verdict.passed() {
                return Ok(report(fixture, Outcome::Migrated, false));
            }
        }

        let todo = fixture.todo();
        let warning_todo = fixture.warning_todo();

        if verdict.passed() {
            let outcome = if todo {
                Outcome::TodoPassed
            } else {
                Outcome::Passed
            };
            return Ok(report(fixture, outcome, false));
        }

        let diffs = verdict.diffs();
        let tolerated = todo || (warning_todo && verdict.warning_only());
        let (outcome, fatal) = match self.config.todo_mode {
            TodoMode::Strict if tolerated => (Outcome::TodoFailed, true),
            TodoMode::Probe if todo || warning_todo => (Outcome::TodoFailed, false),
            _ if tolerated => (Outcome::TodoFailed, false),
            _ => (Outcome::Failed, true),
        };

        Ok(report(fixture, outcome, fatal).with_diffs(diffs))
    }
}

fn report<S, A>(fixture: &Fixture<'_, S, A>, outcome: Outcome, fatal: bool) -> FixtureReport
where
    S: FixtureStore,
    A: CompilerAdapter,
{
    FixtureReport::new(fixture.dir(), fixture.name(), outcome, fatal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MockLogger;
    use crate::select::select;
    use sspec_adapter::{CompileOutput, MockAdapter};
    use sspec_fs::MockFixtureStore;

    fn run_one(
        store: &MockFixtureStore,
        adapter: &MockAdapter,
        config: &RunConfig,
    ) -> (RunSummary, MockLogger) {
        let logger = MockLogger::new();
        let selection = select(store, adapter, config, &logger).unwrap();
        let summary = Runner::new(config, &logger).run(selection);
        (summary, logger)
    }

    fn fixture_store(options: Option<&str>) -> MockFixtureStore {
        let store = MockFixtureStore::new();
        store.add_file("/spec/a/input.scss", "a {b: c}");
        store.add_file("/spec/a/expected_output.css", "a {\n  b: c;\n}\n");
        if let Some(options) = options {
            store.add_file("/spec/a/options.yml", options);
        }
        store
    }

    fn passing() -> CompileOutput {
        CompileOutput::success("a {\n  b: c;\n}\n")
    }

    fn failing() -> CompileOutput {
        CompileOutput::success("a {\n  b: d;\n}\n")
    }

    fn outcome(summary: &RunSummary) -> &Outcome {
        &summary.reports[0].outcome
    }

    // ===========================================
    // Basic outcomes
    // ===========================================

    #[test]
    fn test_pass() {
        let store = fixture_store(None);
        let adapter = MockAdapter::new("sassc").with_default(passing());
        let (summary, _) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(outcome(&summary), &Outcome::Passed);
        assert!(summary.success());
        assert_eq!(summary.implementation, "sassc");
        assert_eq!(summary.language_version, "4.0.0");
    }

    #[test]
    fn test_fail_carries_diffs() {
        let store = fixture_store(None);
        let adapter = MockAdapter::new("sassc").with_default(failing());
        let (summary, _) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(outcome(&summary), &Outcome::Failed);
        assert!(!summary.success());
        let diff = &summary.reports[0].diffs[0];
        assert_eq!(diff.file, "expected_output.css");
        assert_eq!(diff.first_diff_line, Some(2));
    }

    #[test]
    fn test_ignored_not_compiled() {
        let store = fixture_store(Some(":ignore_for:\n- sassc\n"));
        let adapter = MockAdapter::new("sassc").with_default(failing());
        let config = RunConfig::new("/spec");
        let (summary, _) = run_one(&store, &adapter, &config);

        // ignore_for also excludes the fixture during selection
        assert!(summary.reports.is_empty());
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(adapter.call_count(), 0);
    }

    #[test]
    fn test_run_fixture_ignored() {
        let store = fixture_store(None);
        let adapter = MockAdapter::new("sassc").with_default(failing());
        let metadata = crate::metadata::Metadata::from_yaml("a", ":ignore_for:\n- sassc\n").unwrap();
        let mut fixture =
            Fixture::new(&store, &adapter, std::path::Path::new("/spec/a"), metadata).unwrap();
        let config = RunConfig::new("/spec");
        let logger = MockLogger::new();

        let report = Runner::new(&config, &logger).run_fixture(&mut fixture);

        assert_eq!(report.outcome, Outcome::Ignored);
        assert!(!report.fatal);
        assert_eq!(adapter.call_count(), 0);
    }

    #[test]
    fn test_missing_expected_output_warns() {
        let store = MockFixtureStore::new();
        store.add_file("/spec/a/input.scss", "");
        let adapter = MockAdapter::new("sassc").with_default(passing());
        let (summary, logger) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(outcome(&summary), &Outcome::MissingExpectation);
        assert!(summary.success());
        assert!(logger.contains("Expected output file missing for a"));
        assert_eq!(adapter.call_count(), 0);
    }

    #[test]
    fn test_error_fixture_without_output_is_compared() {
        let store = MockFixtureStore::new();
        store.add_file("/spec/a/input.scss", "");
        store.add_file("/spec/a/status", "1\n");
        store.add_file("/spec/a/error", "Error: nope\n");
        let adapter =
            MockAdapter::new("sassc").with_default(CompileOutput::failure("Error: nope\n", 1));
        let (summary, _) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(outcome(&summary), &Outcome::Passed);
    }

    #[test]
    fn test_broken_fixture_is_fatal() {
        let store = fixture_store(None);
        store.add_file("/spec/b/input.scss", "");
        store.add_file("/spec/b/input.sass", "");
        let adapter = MockAdapter::new("sassc").with_default(passing());
        let (summary, logger) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.reports[0].outcome, Outcome::Passed);
        assert!(matches!(summary.reports[1].outcome, Outcome::Errored(_)));
        assert!(!summary.success());
        assert!(logger.contains("multiple input files found"));
    }

    // ===========================================
    // Todo handling
    // ===========================================

    #[test]
    fn test_todo_failing_is_tolerated() {
        let store = fixture_store(Some(":todo:\n- sassc\n"));
        let adapter = MockAdapter::new("sassc").with_default(failing());
        let (summary, _) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(outcome(&summary), &Outcome::TodoFailed);
        assert!(summary.success());
        assert!(summary.todo_passing().is_empty());
    }

    #[test]
    fn test_todo_passing_is_collected() {
        let store = fixture_store(Some(":todo:\n- sassc\n"));
        let adapter = MockAdapter::new("sassc").with_default(passing());
        let (summary, _) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(outcome(&summary), &Outcome::TodoPassed);
        assert_eq!(summary.todo_passing(), vec![std::path::Path::new("/spec/a")]);
    }

    #[test]
    fn test_todo_for_other_impl_fails() {
        let store = fixture_store(Some(":todo:\n- libsass\n"));
        let adapter = MockAdapter::new("sassc").with_default(failing());
        let (summary, _) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(outcome(&summary), &Outcome::Failed);
    }

    #[test]
    fn test_strict_todo_is_fatal() {
        let store = fixture_store(Some(":todo:\n- sassc\n"));
        let adapter = MockAdapter::new("sassc").with_default(failing());
        let config = RunConfig::new("/spec").with_todo_mode(TodoMode::Strict);
        let (summary, _) = run_one(&store, &adapter, &config);

        assert_eq!(outcome(&summary), &Outcome::TodoFailed);
        assert!(!summary.success());
    }

    #[test]
    fn test_warning_todo_tolerates_warning_mismatch() {
        let store = fixture_store(Some(":warning_todo:\n- sassc\n"));
        store.add_file("/spec/a/error", "WARNING: expected\n");
        let adapter = MockAdapter::new("sassc")
            .with_default(passing().with_stderr("WARNING: something else\n"));
        let (summary, _) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(outcome(&summary), &Outcome::TodoFailed);
        assert!(summary.success());
    }

    #[test]
    fn test_warning_todo_does_not_hide_output_mismatch() {
        let store = fixture_store(Some(":warning_todo:\n- sassc\n"));
        let adapter = MockAdapter::new("sassc").with_default(failing());
        let (summary, _) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(outcome(&summary), &Outcome::Failed);

        let config = RunConfig::new("/spec").with_todo_mode(TodoMode::Probe);
        let (summary, _) = run_one(&store, &adapter, &config);
        assert_eq!(outcome(&summary), &Outcome::TodoFailed);
        assert!(summary.success());
    }

    #[test]
    fn test_warning_todo_passing_is_not_promoted() {
        let store = fixture_store(Some(":warning_todo:\n- sassc\n"));
        let adapter = MockAdapter::new("sassc").with_default(passing());
        let (summary, _) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(outcome(&summary), &Outcome::Passed);
        assert!(summary.todo_passing().is_empty());
    }

    #[test]
    fn test_error_fixture_without_error_file_ignores_stderr() {
        let store = MockFixtureStore::new();
        store.add_file("/spec/a/input.scss", "");
        store.add_file("/spec/a/status", "1\n");
        let adapter =
            MockAdapter::new("sassc").with_default(CompileOutput::failure("Error: nope\n", 1));
        let (summary, _) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(outcome(&summary), &Outcome::Passed);
        assert!(summary.reports[0].diffs.is_empty());
        assert!(summary.success());
    }

    #[test]
    fn test_ignore_warning_skips_stderr() {
        let store = fixture_store(Some(":ignore_warning_for:\n- sassc\n"));
        store.add_file("/spec/a/error", "WARNING: expected\n");
        let adapter =
            MockAdapter::new("sassc").with_default(passing().with_stderr("WARNING: other\n"));
        let (summary, _) = run_one(&store, &adapter, &RunConfig::new("/spec"));

        assert_eq!(outcome(&summary), &Outcome::Passed);
    }

    // ===========================================
    // Writes
    // ===========================================

    #[test]
    fn test_generate_writes_qualified_output() {
        let store = fixture_store(None);
        let adapter = MockAdapter::new("sassc").with_default(failing());
        let config = RunConfig::new("/spec").with_generate(true);
        let (summary, _) = run_one(&store, &adapter, &config);

        assert_eq!(outcome(&summary), &Outcome::Generated);
        assert_eq!(
            store
                .get_file(std::path::Path::new("/spec/a/expected_output-sassc.css"))
                .unwrap(),
            b"a {\n  b: d;\n}\n"
        );
        assert_eq!(
            store
                .get_file(std::path::Path::new("/spec/a/expected_output.css"))
                .unwrap(),
            b"a {\n  b: c;\n}\n"
        );
    }

    #[test]
    fn test_migrate_impl_rewrites_mismatch() {
        let store = fixture_store(None);
        let adapter = MockAdapter::new("sassc").with_default(failing());
        let config = RunConfig::new("/spec").with_migrate_impl(true);
        let (summary, _) = run_one(&store, &adapter, &config);

        assert_eq!(outcome(&summary), &Outcome::Migrated);
        assert!(summary.success());
        assert!(store
            .get_file(std::path::Path::new("/spec/a/expected_output-sassc.css"))
            .is_some());
        assert_eq!(adapter.call_count(), 1);
    }

    #[test]
    fn test_migrate_impl_leaves_passing_fixture() {
        let store = fixture_store(None);
        let adapter = MockAdapter::new("sassc").with_default(passing());
        let config = RunConfig::new("/spec").with_migrate_impl(true);
        let (summary, _) = run_one(&store, &adapter, &config);

        assert_eq!(outcome(&summary), &Outcome::Passed);
        assert_eq!(store.len(), 2);
    }
}
