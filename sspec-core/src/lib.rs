//! Expectation resolution and output normalization engine for sass-spec.
//!
//! A fixture is a directory holding one `input.sass` / `input.scss` file,
//! the expected artifacts (`expected_output.css`, `error`, `status`, each
//! optionally qualified by implementation name) and an optional
//! `options.yml`. This crate selects the fixtures that apply to a run,
//! compiles each one through a `CompilerAdapter`, normalizes actual and
//! expected text and classifies the result.

pub mod config;
pub mod error;
pub mod error_text;
pub mod expectation;
pub mod fixture;
pub mod logger;
pub mod metadata;
pub mod normalize;
pub mod runner;
pub mod select;
pub mod types;

pub use config::{
    coerce_version, resolve_language_version, RunConfig, TodoMode, MAX_LANGUAGE_VERSION,
};
pub use error::{ConfigError, FixtureError, MetadataError};
pub use error_text::clean_error;
pub use expectation::{qualified_name, resolve, resolve_kind, ExpectationKind};
pub use fixture::{parse_status, CompiledOutput, Fixture};
pub use logger::{LogEntry, Logger, MockLogger, NullLogger, StderrLogger, Verbosity};
pub use metadata::{Metadata, DEFAULT_PRECISION, OPTIONS_FILE};
pub use normalize::{clean_output, crlf_to_lf, norm_output, normalize};
pub use runner::Runner;
pub use select::{applicability, discover, select, Candidate, Selection, SelectionError};
pub use types::{
    Check, FileDiff, FixtureReport, Outcome, RunSummary, Skip, SkipReason, Verdict,
};
