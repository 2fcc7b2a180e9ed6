//! Wildcard matching for exclusion patterns.
//!
//! Only the `prefix*middle*suffix` subset is supported: `*` stands for any
//! run of characters (including none) and every other character is literal.
//! Comparison is case-insensitive.

use crate::paths::to_platform_separators;

/// A pattern split into the literal segments around its `*` positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPattern {
    segments: Vec<String>,
}

impl ExclusionPattern {
    /// The empty pattern has no segments and matches everything.
    pub fn parse(pattern: &str) -> Self {
        let segments = if pattern.is_empty() {
            Vec::new()
        } else {
            pattern.split('*').map(str::to_lowercase).collect()
        };
        Self { segments }
    }

    /// `true` for the bare `*` pattern.
    pub fn is_match_all(&self) -> bool {
        self.segments.len() == 2 && self.segments.iter().all(String::is_empty)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn matches(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        let segments = &self.segments;

        match segments.len() {
            0 => return true,
            1 => return value == segments[0],
            _ => {}
        }

        let first = &segments[0];
        if !value.starts_with(first.as_str()) {
            return false;
        }
        let mut start = first.len();

        let last = &segments[segments.len() - 1];
        if !value[start..].ends_with(last.as_str()) {
            return false;
        }
        let end = value.len() - last.len();

        for segment in &segments[1..segments.len() - 1] {
            if start == end {
                return false;
            }
            match value[start..end].find(segment.as_str()) {
                Some(offset) => start += offset + segment.len(),
                None => return false,
            }
        }
        true
    }
}

/// Case-insensitive wildcard match of `value` against a single `pattern`.
pub fn matches(value: &str, pattern: &str) -> bool {
    ExclusionPattern::parse(pattern).matches(value)
}

/// A configured list of patterns, as used for analyzer and file exclusion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<ExclusionPattern>,
    match_all: bool,
}

impl PatternSet {
    /// Blank entries are skipped; the rest are trimmed and their separators
    /// rewritten to the platform separator.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<ExclusionPattern> = patterns
            .into_iter()
            .filter(|p| !p.as_ref().trim().is_empty())
            .map(|p| ExclusionPattern::parse(&to_platform_separators(p.as_ref().trim())))
            .collect();
        let match_all = patterns.iter().any(ExclusionPattern::is_match_all);
        Self {
            patterns,
            match_all,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// A set holding `*` matches anything, even a missing value. Otherwise a
    /// missing or blank value never matches.
    pub fn matches_any(&self, value: Option<&str>) -> bool {
        if self.match_all {
            return true;
        }
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return false;
        };
        let value = to_platform_separators(value);
        self.patterns.iter().any(|p| p.matches(&value))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
