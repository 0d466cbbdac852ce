//! Error types for the `requery` crate.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RequeryError>;

/// Top-level errors. Container-level failures abort the whole query; chunk
/// decode failures are collected per chunk instead (see [`DecodeError`]).
#[derive(Debug, Error)]
pub enum RequeryError {
    #[error("recording not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid recording header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid chunk table: {reason}")]
    InvalidTable { reason: String },

    #[error("chunk decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A failure scoped to a single chunk's columns. The query engine skips the
/// offending chunk and reports the error alongside the partial result.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeError {
    #[error("column `{column}` span out of bounds (offset {offset}, length {length})")]
    OutOfBounds {
        column: String,
        offset: u64,
        length: u64,
    },

    #[error("column `{column}` checksum mismatch")]
    ChecksumMismatch { column: String },

    #[error("column `{column}` has unknown encoding tag {tag}")]
    UnknownEncoding { column: String, tag: u8 },

    #[error("column `{column}` has unknown compression tag {tag}")]
    UnknownCompression { column: String, tag: u8 },

    #[error("column `{column}` shape mismatch: {reason}")]
    ShapeMismatch { column: String, reason: String },

    #[error("column `{column}` row {row} is not valid UTF-8")]
    InvalidText { column: String, row: u64 },
}
