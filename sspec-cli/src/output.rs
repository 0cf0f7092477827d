//! Human readable run summary.

use std::io::{self, Write};

use sspec_core::{FixtureReport, Outcome, RunSummary};

fn label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Passed => "PASS",
        Outcome::Failed => "FAIL",
        Outcome::TodoPassed => "TODO PASS",
        Outcome::TodoFailed => "TODO FAIL",
        Outcome::Ignored => "IGNORED",
        Outcome::MissingExpectation => "NO EXPECTATION",
        Outcome::Generated => "GENERATED",
        Outcome::Migrated => "MIGRATED",
        Outcome::Errored(_) => "ERROR",
    }
}

fn write_failure<W: Write>(out: &mut W, report: &FixtureReport) -> io::Result<()> {
    writeln!(out, "{}: {}", label(&report.outcome), report.name)?;
    if let Outcome::Errored(message) = &report.outcome {
        writeln!(out, "  {}", message)?;
    }
    for diff in &report.diffs {
        match diff.first_diff_line {
            Some(line) => writeln!(out, "  {} differs at line {}", diff.file, line)?,
            None => writeln!(out, "  {} differs", diff.file)?,
        }
        if let Some(expected) = &diff.expected_excerpt {
            writeln!(out, "    expected: {}", expected)?;
        }
        if let Some(actual) = &diff.actual_excerpt {
            writeln!(out, "    actual:   {}", actual)?;
        }
    }
    Ok(())
}

/// Write the end-of-run report: fatal fixtures with their diffs, outcome
/// counts and the todo promotion note.
pub fn write_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    for report in summary.fatal_reports() {
        write_failure(out, report)?;
    }

    writeln!(
        out,
        "{} passed, {} failed, {} errored, {} todo, {} skipped",
        summary.count(&Outcome::Passed),
        summary.count(&Outcome::Failed),
        summary.errored(),
        summary.count(&Outcome::TodoPassed) + summary.count(&Outcome::TodoFailed),
        summary.skipped.len()
    )?;

    let generated = summary.count(&Outcome::Generated) + summary.count(&Outcome::Migrated);
    if generated > 0 {
        writeln!(out, "{} expected output files written", generated)?;
    }

    let missing = summary.count(&Outcome::MissingExpectation);
    if missing > 0 {
        writeln!(out, "{} fixtures have no expected output", missing)?;
    }

    let todo_passing = summary.todo_passing();
    if !todo_passing.is_empty() {
        writeln!(
            out,
            "The following tests pass but were marked as TODO for {}:",
            summary.implementation
        )?;
        for path in todo_passing {
            writeln!(out, "{}", path.display())?;
        }
    } else if summary.count(&Outcome::TodoFailed) > 0 {
        writeln!(
            out,
            "Note: All tests marked as TODO for {} are still failing.",
            summary.implementation
        )?;
    }

    Ok(())
}
