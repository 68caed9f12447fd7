//! Path-anchored glob matching shared by the pattern rule and ownership
//! file strategies.

use globset::{GlobBuilder, GlobMatcher};

use crate::error::{Result, TriageError};

/// Compile a glob with shell path semantics: `*`, `?` and character classes
/// never cross a `/`, while `**` spans any number of directories. The whole
/// path must match.
pub fn compile(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| TriageError::InvalidPattern {
            pattern: pattern.to_string(),
            cause: e.kind().to_string(),
        })
}

/// Check a single pattern against a path. Invalid patterns never match.
pub fn matches(pattern: &str, path: &str) -> bool {
    match compile(pattern) {
        Ok(matcher) => matcher.is_match(path),
        Err(_) => false,
    }
}
