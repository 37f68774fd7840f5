//! Compiler version detection from `pragma solidity` directives.
//!
//! This is a best-effort heuristic, not a semver solver: the first pattern
//! class that matches anywhere in the text wins, and its first match is used.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::DEFAULT_COMPILER_VERSION;

// Tried in order: caret-constrained, lower-bound, exact
static CARET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pragma\s+solidity\s*\^?\s*(\d+\.\d+\.\d+)").unwrap());
static LOWER_BOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pragma\s+solidity\s*>=?\s*(\d+\.\d+\.\d+)").unwrap());
static EXACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pragma\s+solidity\s+(\d+\.\d+\.\d+)").unwrap());

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").unwrap());

/// Version requested by the source's pragma, if any pattern matches
pub fn find_pragma_version(source: &str) -> Option<String> {
    [&*CARET_RE, &*LOWER_BOUND_RE, &*EXACT_RE]
        .into_iter()
        .find_map(|pattern| pattern.captures(source))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Version requested by the source's pragma, or the default compiler version
pub fn detect_version(source: &str) -> String {
    find_pragma_version(source).unwrap_or_else(|| DEFAULT_COMPILER_VERSION.to_string())
}

/// True for plain `X.Y.Z` version strings
pub fn is_plain_version(version: &str) -> bool {
    VERSION_RE.is_match(version)
}

/// `major.minor` prefix of a version string (`"0.8.19"` -> `"0.8"`)
pub fn major_minor(version: &str) -> String {
    version.split('.').take(2).collect::<Vec<_>>().join(".")
}
