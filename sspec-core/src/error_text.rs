//! Error text canonicalization.
//!
//! Error messages embed file paths that differ between machines and between
//! todo-staging directories. Both stderr and the stored `error` expectation
//! are passed through `clean_error` before they are compared, so messages
//! that differ only in those fragments compare equal.

use std::sync::LazyLock;

use regex::bytes::Regex;

/// `/todo_` prefix or `_todo/` suffix around a path separator.
static TODO_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:/todo_|_todo/)").expect("valid regex pattern"));

static IMPL_TESTS_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/libsass-[a-z]+-tests/").expect("valid regex pattern"));

static IMPL_ISSUES_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/libsass-[a-z]+-issues/").expect("valid regex pattern"));

/// Any path leading up to a `spec/` directory, with either separator.
static SPEC_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)(?:[\w/.\-\\:]+?[/\\]|[/\\])?spec[/\\]+").expect("valid regex pattern")
});

static TRAILING_LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n)*\z").expect("valid regex pattern"));

static ONLY_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)\A\s+\z").expect("valid regex pattern"));

/// Canonical segment issue directories are rewritten to.
pub const CANONICAL_ISSUES_DIR: &[u8] = b"/libsass-issues/";

/// Canonical fragment every spec directory path is rewritten to.
pub const CANONICAL_SPEC_DIR: &[u8] = b"/sass/spec/";

/// Canonicalize error text. The rewrites are order-sensitive.
pub fn clean_error(err: &[u8]) -> Vec<u8> {
    let text = TODO_MARKER.replace_all(err, &b"/"[..]);
    let text = IMPL_TESTS_DIR.replace_all(&text, &b"/"[..]);
    let text = IMPL_ISSUES_DIR.replace_all(&text, CANONICAL_ISSUES_DIR);
    let text = SPEC_DIR.replace_all(&text, CANONICAL_SPEC_DIR);
    let text = TRAILING_LINE_BREAKS.replace(&text, &b"\n"[..]);
    ONLY_WHITESPACE.replace(&text, &b""[..]).into_owned()
}
