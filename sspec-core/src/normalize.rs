//! Output normalization.
//!
//! Compiler output and stored expectations are compared as raw bytes. Two
//! tiers of canonicalization are applied symmetrically to both sides:
//!
//! - `norm_output` for every fixture: runs of line breaks (`\n` or `\r\n`)
//!   collapse to a single `\n`.
//! - `clean_output` for fixtures with the `clean` flag: additionally collapses
//!   all whitespace and the spacing around commas.
//!
//! `crlf_to_lf` is a separate transform applied to the raw stdout/stderr
//! handed back to callers.

use std::sync::LazyLock;

use regex::bytes::Regex;

static LINE_BREAK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n)+").expect("valid regex pattern"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)\s+").expect("valid regex pattern"));

static COMMA_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)\s*,\s*").expect("valid regex pattern"));

static CRLF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n").expect("valid regex pattern"));

/// Collapse every run of line breaks into a single `\n`.
///
/// A lone `\r` that is not followed by `\n` is left alone.
pub fn norm_output(css: &[u8]) -> Vec<u8> {
    LINE_BREAK_RUN.replace_all(css, &b"\n"[..]).into_owned()
}

/// Whitespace- and comma-insensitive normalization.
pub fn clean_output(css: &[u8]) -> Vec<u8> {
    let normed = norm_output(css);
    let spaced = WHITESPACE_RUN.replace_all(&normed, &b" "[..]);
    COMMA_SPACING.replace_all(&spaced, &b","[..]).into_owned()
}

/// Apply the normalization tier selected by the fixture's `clean` flag.
pub fn normalize(css: &[u8], clean: bool) -> Vec<u8> {
    if clean {
        clean_output(css)
    } else {
        norm_output(css)
    }
}

/// Rewrite Windows line feeds to `\n`.
pub fn crlf_to_lf(text: &[u8]) -> Vec<u8> {
    CRLF.replace_all(text, &b"\n"[..]).into_owned()
}
