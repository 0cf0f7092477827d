//! Fixture discovery and selection.
//!
//! Discovery turns the requested paths into fixture directories. Selection
//! loads each directory's metadata, drops fixtures that do not apply to this
//! run and constructs the rest. Broken fixtures are collected rather than
//! aborting the run.

use std::path::{Path, PathBuf};

use sspec_adapter::CompilerAdapter;
use sspec_fs::{expand_path, FixtureStore, FsError};

use crate::config::RunConfig;
use crate::error::FixtureError;
use crate::fixture::Fixture;
use crate::logger::Logger;
use crate::metadata::{default_name, Metadata};
use crate::types::{Skip, SkipReason};

/// A fixture directory found during discovery.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Candidate {
    pub dir: PathBuf,
    /// The input file that marked the directory.
    pub input: PathBuf,
}

/// A fixture that could not be constructed.
#[derive(Debug)]
pub struct SelectionError {
    pub dir: PathBuf,
    pub name: String,
    pub error: FixtureError,
}

/// Fixtures chosen for a run.
pub struct Selection<'a, S: FixtureStore, A: CompilerAdapter> {
    pub implementation: String,
    pub fixtures: Vec<Fixture<'a, S, A>>,
    pub skipped: Vec<Skip>,
    pub errors: Vec<SelectionError>,
}

impl<S: FixtureStore, A: CompilerAdapter> Selection<'_, S, A> {
    /// Fixture directories in selection order.
    pub fn dirs(&self) -> Vec<&Path> {
        self.fixtures.iter().map(|f| f.dir()).collect()
    }
}

/// Find fixture directories below `dirs`.
///
/// A path that is not a directory stands for its parent, so a single
/// fixture can be targeted through any file inside it. Each directory
/// appears once, sorted.
pub fn discover<S>(store: &S, dirs: &[PathBuf]) -> Result<Vec<Candidate>, FsError>
where
    S: FixtureStore + ?Sized,
{
    let mut candidates: Vec<Candidate> = Vec::new();

    for target in dirs {
        let root = if store.is_dir(target) {
            target.as_path()
        } else {
            target.parent().unwrap_or(target.as_path())
        };

        for input in store.find_inputs(root)? {
            let Some(dir) = input.parent() else {
                continue;
            };
            candidates.push(Candidate {
                dir: dir.to_path_buf(),
                input,
            });
        }
    }

    candidates.sort();
    candidates.dedup_by(|a, b| a.dir == b.dir);
    Ok(candidates)
}

/// Decide whether a fixture applies to this run. Pure; checks run in a
/// fixed order and the first failing check is reported.
pub fn applicability(
    metadata: &Metadata,
    input: &Path,
    impl_name: &str,
    config: &RunConfig,
) -> Option<SkipReason> {
    if !metadata.valid_for_version(&config.language_version) {
        return Some(SkipReason::Version);
    }
    if !metadata.valid_for_impl(impl_name) {
        return Some(SkipReason::Implementation);
    }
    if !input.to_string_lossy().contains(config.filter.as_str()) {
        return Some(SkipReason::Filter);
    }
    if !config.output_styles.is_empty() {
        let allowed = metadata
            .output_style()
            .map_or(false, |style| config.output_styles.contains(&style));
        if !allowed {
            return Some(SkipReason::OutputStyle);
        }
    }
    None
}

/// Discover, filter and construct the fixtures for a run.
///
/// The spec root and the targets are expanded to absolute paths first so
/// `options.yml` inheritance does not depend on how they were spelled.
pub fn select<'a, S, A>(
    store: &'a S,
    adapter: &'a A,
    config: &RunConfig,
    logger: &dyn Logger,
) -> Result<Selection<'a, S, A>, FsError>
where
    S: FixtureStore,
    A: CompilerAdapter,
{
    let implementation = adapter.describe();
    let mut selection = Selection {
        implementation: implementation.clone(),
        fixtures: Vec::new(),
        skipped: Vec::new(),
        errors: Vec::new(),
    };

    let spec_root = expand_path(&config.spec_root)?;
    let targets = config
        .dirs
        .iter()
        .map(|dir| expand_path(dir))
        .collect::<Result<Vec<_>, _>>()?;

    for candidate in discover(store, &targets)? {
        let dir = candidate.dir;
        let metadata = match Metadata::load(store, &dir, &spec_root) {
            Ok(metadata) => metadata,
            Err(err) => {
                selection.errors.push(SelectionError {
                    name: default_name(&dir, &spec_root),
                    dir,
                    error: err.into(),
                });
                continue;
            }
        };

        if let Some(reason) = applicability(&metadata, &candidate.input, &implementation, config) {
            log_skip(logger, &metadata, &reason, &implementation, config);
            selection.skipped.push(Skip { path: dir, reason });
            continue;
        }

        let name = metadata.name().to_string();
        match Fixture::new(store, adapter, &dir, metadata) {
            Ok(fixture) => selection.fixtures.push(fixture),
            Err(error) => selection.errors.push(SelectionError { dir, name, error }),
        }
    }

    logger.debug(&format!(
        "selected {} fixtures, skipped {}, {} broken",
        selection.fixtures.len(),
        selection.skipped.len(),
        selection.errors.len()
    ));

    Ok(selection)
}

fn log_skip(
    logger: &dyn Logger,
    metadata: &Metadata,
    reason: &SkipReason,
    impl_name: &str,
    config: &RunConfig,
) {
    let name = metadata.name();
    let message = match reason {
        SkipReason::Version => {
            format!("{} does not apply to Sass {}", name, config.language_version)
        }
        SkipReason::Implementation => format!("{} does not apply to {}", name, impl_name),
        SkipReason::Filter => format!("{} does not match filter {:?}", name, config.filter),
        SkipReason::OutputStyle => format!("{} does not use a selected output style", name),
    };
    logger.verbose(&message);
}
