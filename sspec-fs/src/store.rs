//! Fixture store trait and implementations.
//!
//! The harness only ever reads a few well-known files from a fixture
//! directory, discovers fixture inputs recursively, and (in generate mode)
//! overwrites a single expectation file. Everything goes through
//! `FixtureStore` so the engine can be exercised against an in-memory tree.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

use glob::Pattern;
use thiserror::Error;
use walkdir::WalkDir;

/// Input files that mark a directory as a fixture during discovery.
pub const SPEC_INPUT_PATTERN: &str = "input.s[ac]ss";

/// Input files counted when a fixture is constructed.
pub const FIXTURE_INPUT_PATTERN: &str = "input.*";

/// Errors from fixture store operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("path error: {0}")]
    Path(String),
}

/// Trait for fixture store operations.
/// Abstracted for testing with mock implementations.
pub trait FixtureStore: Send + Sync {
    /// Read file contents as raw bytes. No decoding is applied.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// Check if a regular file exists at `path`.
    fn is_file(&self, path: &Path) -> bool;

    /// Check if a directory exists at `path`.
    fn is_dir(&self, path: &Path) -> bool;

    /// Write data atomically to a path (write to temp, then rename).
    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), FsError>;

    /// Recursively find every `input.sass` / `input.scss` below `root`.
    /// Results are sorted.
    fn find_inputs(&self, root: &Path) -> Result<Vec<PathBuf>, FsError>;

    /// List the `input.*` files directly inside `dir`. Results are sorted.
    fn list_inputs(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError>;
}

fn pattern(raw: &str) -> Pattern {
    Pattern::new(raw).expect("valid glob pattern")
}

fn file_name_matches(path: &Path, pattern: &Pattern) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| pattern.matches(n))
}

/// Make `path` absolute against the working directory and drop `.` and `..`
/// components lexically. Symlinks are not resolved.
pub fn expand_path(path: &Path) -> Result<PathBuf, FsError> {
    let absolute = std::path::absolute(path)?;
    let mut expanded = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                expanded.pop();
            }
            other => expanded.push(other.as_os_str()),
        }
    }
    Ok(expanded)
}

/// Real filesystem implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFixtureStore;

impl FixtureStore for RealFixtureStore {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        Ok(fs::read(path)?)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FsError::Path(format!("no file name: {}", path.display())))?;
        let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

        fs::write(&temp_path, data)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    fn find_inputs(&self, root: &Path) -> Result<Vec<PathBuf>, FsError> {
        let matcher = pattern(SPEC_INPUT_PATTERN);
        let mut inputs = Vec::new();

        if !root.is_dir() {
            return Ok(inputs);
        }

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry?;
            if entry.file_type().is_file() && file_name_matches(entry.path(), &matcher) {
                inputs.push(entry.into_path());
            }
        }

        inputs.sort();
        Ok(inputs)
    }

    fn list_inputs(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
        let matcher = pattern(FIXTURE_INPUT_PATTERN);
        let mut inputs = Vec::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && file_name_matches(&path, &matcher) {
                inputs.push(path);
            }
        }

        inputs.sort();
        Ok(inputs)
    }
}

/// Mock fixture store for testing.
/// Cloning creates a new handle to the same underlying data.
/// Directories exist implicitly as ancestors of stored files.
#[derive(Debug, Clone, Default)]
pub struct MockFixtureStore {
    files: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
}

impl MockFixtureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file directly (for test setup).
    pub fn add_file(&self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) {
        self.files
            .write()
            .unwrap()
            .insert(path.into(), data.into());
    }

    /// Get content of a specific file.
    pub fn get_file(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().unwrap().get(path).cloned()
    }

    /// Number of files held.
    pub fn len(&self) -> usize {
        self.files.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching(&self, matcher: &Pattern, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .files
            .read()
            .unwrap()
            .keys()
            .filter(|p| keep(p) && file_name_matches(p, matcher))
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}

impl FixtureStore for MockFixtureStore {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        self.get_file(path).ok_or_else(|| {
            FsError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            ))
        })
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .read()
            .unwrap()
            .keys()
            .any(|p| p != path && p.starts_with(path))
    }

    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        self.add_file(path, data);
        Ok(())
    }

    fn find_inputs(&self, root: &Path) -> Result<Vec<PathBuf>, FsError> {
        Ok(self.matching(&pattern(SPEC_INPUT_PATTERN), |p| p.starts_with(root)))
    }

    fn list_inputs(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
        Ok(self.matching(&pattern(FIXTURE_INPUT_PATTERN), |p| {
            p.parent() == Some(dir)
        }))
    }
}
