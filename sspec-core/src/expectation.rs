//! Expectation path resolution.
//!
//! Each expectation kind has a base file name inside the fixture directory and
//! an implementation-qualified variant with `-<impl>` inserted before the
//! extension (`expected_output-dart-sass.css`, `error-libsass`). When the
//! qualified file exists it wins; otherwise the base path is returned whether
//! or not it exists. Callers decide what a missing file means.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sspec_fs::FixtureStore;

/// Logical expectation artifacts of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectationKind {
    Output,
    Error,
    Status,
}

impl ExpectationKind {
    pub const ALL: [ExpectationKind; 3] = [
        ExpectationKind::Output,
        ExpectationKind::Error,
        ExpectationKind::Status,
    ];

    /// Unqualified file name.
    pub fn base_name(&self) -> &'static str {
        match self {
            ExpectationKind::Output => "expected_output.css",
            ExpectationKind::Error => "error",
            ExpectationKind::Status => "status",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            ExpectationKind::Output => 0,
            ExpectationKind::Error => 1,
            ExpectationKind::Status => 2,
        }
    }

    pub fn base_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.base_name())
    }

    pub fn qualified_path(&self, dir: &Path, impl_name: &str) -> PathBuf {
        dir.join(qualified_name(self.base_name(), impl_name))
    }
}

/// Insert `-<impl>` before the extension of `base`.
pub fn qualified_name(base: &str, impl_name: &str) -> String {
    let path = Path::new(base);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, impl_name, ext.to_string_lossy()),
        None => format!("{}-{}", stem, impl_name),
    }
}

/// Pick the file to read for `base` in `dir`.
pub fn resolve<S>(store: &S, dir: &Path, base: &str, impl_name: &str) -> PathBuf
where
    S: FixtureStore + ?Sized,
{
    let qualified = dir.join(qualified_name(base, impl_name));
    if store.is_file(&qualified) {
        qualified
    } else {
        dir.join(base)
    }
}

/// Pick the file to read for an expectation kind in `dir`.
pub fn resolve_kind<S>(store: &S, dir: &Path, kind: ExpectationKind, impl_name: &str) -> PathBuf
where
    S: FixtureStore + ?Sized,
{
    resolve(store, dir, kind.base_name(), impl_name)
}
