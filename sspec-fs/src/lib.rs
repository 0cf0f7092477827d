//! Fixture store abstraction for the sass-spec harness.
//!
//! This crate provides:
//! - `FixtureStore` trait for the handful of file operations the harness needs
//! - `RealFixtureStore` backed by the local filesystem
//! - `MockFixtureStore` backed by an in-memory map, for tests

pub mod store;

pub use store::{
    expand_path, FixtureStore, FsError, MockFixtureStore, RealFixtureStore, FIXTURE_INPUT_PATTERN,
    SPEC_INPUT_PATTERN,
};
