//! Hierarchical entity paths identifying logical objects within a recording.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered sequence of string segments, totally ordered lexicographically
/// by segment. The canonical display form is slash-joined with a leading
/// slash (`/a/gripper`); an empty path displays as `/`.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityPath {
    segments: Vec<String>,
}

impl EntityPath {
    /// Parse a slash-delimited path. Empty segments (leading, trailing, or
    /// doubled slashes) are dropped, so `/a/gripper`, `a/gripper`, and
    /// `a//gripper/` all parse to the same path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: raw
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `prefix` is a structural prefix of this path's segments.
    #[must_use]
    pub fn starts_with_segments(&self, prefix: &[&str]) -> bool {
        prefix.len() <= self.segments.len()
            && prefix
                .iter()
                .zip(&self.segments)
                .all(|(a, b)| *a == b.as_str())
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for EntityPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}
