//! Entity-path and component-type filters.
//!
//! The wire convention is "empty pattern matches everything"; both filters
//! represent that sentinel as an explicit `All` variant so an empty pattern
//! string can never be confused with a legitimately empty path segment.

use crate::types::EntityPath;

/// Filter over entity paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFilter {
    /// Match every path.
    All,
    /// Match when the pattern's segments are a structural prefix of the
    /// path's segments, or when the literal pattern occurs as a contiguous
    /// substring of the path's canonical slash-joined form.
    Pattern(String),
}

impl PathFilter {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        if pattern.is_empty() {
            Self::All
        } else {
            Self::Pattern(pattern.to_owned())
        }
    }

    /// Case-sensitive, total, pure.
    #[must_use]
    pub fn matches(&self, path: &EntityPath) -> bool {
        match self {
            Self::All => true,
            Self::Pattern(pattern) => {
                let prefix: Vec<&str> = pattern
                    .split('/')
                    .filter(|segment| !segment.is_empty())
                    .collect();
                if !prefix.is_empty() && path.starts_with_segments(&prefix) {
                    return true;
                }
                let joined = path.to_string();
                memchr::memmem::find(joined.as_bytes(), pattern.as_bytes()).is_some()
            }
        }
    }
}

/// Filter over a chunk's component tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentFilter {
    /// Match every chunk.
    All,
    /// Match when any member of the tag set starts with the pattern (exact
    /// membership is the full-length prefix case). Unknown patterns simply
    /// match nothing.
    Tag(String),
}

impl ComponentFilter {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        if pattern.is_empty() {
            Self::All
        } else {
            Self::Tag(pattern.to_owned())
        }
    }

    #[must_use]
    pub fn matches(&self, components: &[String]) -> bool {
        match self {
            Self::All => true,
            Self::Tag(tag) => components.iter().any(|c| c.starts_with(tag.as_str())),
        }
    }
}
