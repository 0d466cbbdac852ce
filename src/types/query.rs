//! Query result records returned by the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::types::{DataCell, EntityPath};

/// One decoded textual annotation attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaChunk {
    pub entity_path: EntityPath,
    /// Media type of the annotation, when the chunk carries a `media_type`
    /// column (e.g. `text/markdown`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub text: String,
}

/// All data matching a query for one entity path, aggregated in file order:
/// timelines are unioned by name (concatenated on collision), data cells are
/// concatenated chunk by chunk, row by row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataChunk {
    pub entity_path: EntityPath,
    pub timelines: BTreeMap<String, Vec<i64>>,
    pub data: Vec<DataCell>,
}

/// Record of a chunk skipped because its columns failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFailure {
    pub entity_path: EntityPath,
    /// Position of the chunk in the container's file order.
    pub ordinal: usize,
    pub error: DecodeError,
}

/// Response of a metadata query: decoded annotations plus any skipped chunks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaResponse {
    pub chunks: Vec<MetaChunk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ChunkFailure>,
}

/// Response of a data or action query: one [`DataChunk`] per matching entity
/// path plus any skipped chunks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    pub chunks: Vec<DataChunk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ChunkFailure>,
}

impl DataResponse {
    /// Look up the aggregate for one entity path, if it matched.
    #[must_use]
    pub fn entity(&self, path: &EntityPath) -> Option<&DataChunk> {
        self.chunks.iter().find(|chunk| &chunk.entity_path == path)
    }
}

impl MetaResponse {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty() && self.skipped.is_empty()
    }
}
