//! Error types for the harness engine.

use std::path::{Path, PathBuf};

use sspec_adapter::AdapterError;
use sspec_fs::FsError;
use thiserror::Error;

/// Errors that can occur when loading fixture metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: FsError,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid version {value:?} in {path}")]
    InvalidVersion { path: String, value: String },
}

/// Errors that abort processing of a single fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("no input file found in {}", .0.display())]
    NoInput(PathBuf),

    #[error("multiple input files found in {}: {}", .dir.display(), join_paths(.inputs))]
    MultipleInputs { dir: PathBuf, inputs: Vec<PathBuf> },

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("fixture store error: {0}")]
    Store(#[from] FsError),

    #[error("compiler error: {0}")]
    Adapter(#[from] AdapterError),
}

/// Errors in the run configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid language version: {0}")]
    InvalidLanguageVersion(String),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn display(path: &Path) -> String {
    path.display().to_string()
}
