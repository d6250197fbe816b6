//! Dotted path patterns selecting which nested values to extract
//!
//! Patterns use the dotted notation familiar from streaming JSON tools:
//! `hexes.*` selects every element of the top-level `hexes` array,
//! `data.items.2` selects the third element of a nested array, and `*`
//! selects every member of the root container. A leading `$.` is accepted
//! and ignored.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ScanError;

// Object keys in a dotted pattern cannot contain dots or whitespace
static KEY_SEGMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^.\s]+$").unwrap()
});

/// One segment of a parsed path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Match a specific object key
    Key(String),
    /// Match a specific array index
    Index(usize),
    /// Match any key or index at this level
    Wildcard,
}

/// One step of the concrete location of a value inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep<'a> {
    Key(&'a str),
    Index(usize),
}

/// A parsed path pattern, matched against concrete value locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
    raw: String,
}

impl PathPattern {
    /// Parse a dotted pattern string such as `hexes.*`
    pub fn parse(pattern: &str) -> Result<PathPattern, ScanError> {
        let raw = pattern.to_string();
        let err = |reason: &str| ScanError::Pattern {
            pattern: raw.clone(),
            reason: reason.to_string(),
        };

        let trimmed = pattern.trim();
        let body = trimmed
            .strip_prefix("$.")
            .or_else(|| trimmed.strip_prefix('$'))
            .unwrap_or(trimmed);

        if body.is_empty() {
            return Err(err("pattern selects nothing"));
        }

        let mut segments = Vec::new();
        for part in body.split('.') {
            if part.is_empty() {
                return Err(err("empty segment"));
            }
            if part == "*" {
                segments.push(Segment::Wildcard);
            } else if part.bytes().all(|b| b.is_ascii_digit()) {
                let index = part
                    .parse::<usize>()
                    .map_err(|_| err("array index out of range"))?;
                segments.push(Segment::Index(index));
            } else if KEY_SEGMENT_REGEX.is_match(part) {
                segments.push(Segment::Key(part.to_string()));
            } else {
                return Err(err("segment contains whitespace"));
            }
        }

        Ok(PathPattern { segments, raw })
    }

    /// Number of nesting levels this pattern selects at
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Check whether a concrete location matches this pattern
    ///
    /// Only exact-depth locations match: a pattern of depth 2 never matches
    /// a value nested 3 levels deep.
    pub fn matches(&self, steps: &[PathStep<'_>]) -> bool {
        if steps.len() != self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(steps)
            .all(|(segment, step)| match (segment, step) {
                (Segment::Wildcard, _) => true,
                (Segment::Key(k), PathStep::Key(s)) => k == s,
                (Segment::Index(i), PathStep::Index(j)) => i == j,
                _ => false,
            })
    }

    /// The pattern string as originally supplied
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
