//! Serialized chunk table types.
//!
//! The chunk table is the container's index: one [`ChunkRecord`] per chunk in
//! file order, each addressing its timeline and data columns as byte spans in
//! the payload region. Encoded with bincode (fixed-int, little-endian) and
//! protected by a blake3 checksum recorded in the header.

use serde::{Deserialize, Serialize};

use crate::error::{RequeryError, Result};

/// Data column encoding, stored in the table as a raw `u8` tag so an unknown
/// tag surfaces as a chunk-scoped decode error instead of a table failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnEncoding {
    /// Fixed-width `f64`, 8 bytes per row.
    Scalar,
    /// Variable-length per row: `[ndim: u32][dim: u32 x ndim][f64 x prod(dims)]`.
    Tensor,
    /// Variable-length per row: `[len: u32][UTF-8 bytes]`.
    Text,
}

impl ColumnEncoding {
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Scalar => 0,
            Self::Tensor => 1,
            Self::Text => 2,
        }
    }

    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Scalar),
            1 => Some(Self::Tensor),
            2 => Some(Self::Text),
            _ => None,
        }
    }
}

/// Per-column compression applied to the stored bytes of a data column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCompression {
    None,
    /// `lz4_flex` size-prepended block.
    Lz4,
}

impl ColumnCompression {
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Lz4 => 1,
        }
    }

    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            1 => Some(Self::Lz4),
            _ => None,
        }
    }
}

/// A named timeline column: `num_rows` timestamps as `i64` little-endian,
/// always uncompressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineColumn {
    pub name: String,
    pub bytes_offset: u64,
    pub bytes_length: u64,
    pub checksum: [u8; 32],
}

/// A named data column. The checksum covers the stored (possibly compressed)
/// bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataColumn {
    pub name: String,
    pub encoding: u8,
    pub compression: u8,
    pub bytes_offset: u64,
    pub bytes_length: u64,
    pub checksum: [u8; 32],
}

/// One chunk table entry. Every column of a chunk holds exactly `num_rows`
/// rows; the decoders enforce this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub entity_path: String,
    /// Component tag set, e.g. `["scalar"]` or `["action", "tensor"]`.
    pub components: Vec<String>,
    pub num_rows: u64,
    pub timelines: Vec<TimelineColumn>,
    pub columns: Vec<DataColumn>,
}

/// The decoded chunk table, in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkTable {
    pub chunks: Vec<ChunkRecord>,
}

impl ChunkTable {
    pub(crate) fn decode(bytes: &[u8]) -> Result<Self> {
        let (table, consumed) =
            bincode::serde::decode_from_slice::<Self, _>(bytes, crate::table_config()).map_err(
                |err| RequeryError::InvalidTable {
                    reason: format!("chunk table decode failed: {err}"),
                },
            )?;
        if consumed != bytes.len() {
            return Err(RequeryError::InvalidTable {
                reason: format!(
                    "trailing bytes after chunk table ({consumed} of {} consumed)",
                    bytes.len()
                ),
            });
        }
        Ok(table)
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> Vec<u8> {
        bincode::serde::encode_to_vec(self, crate::table_config())
            .expect("chunk table encoding cannot fail")
    }
}
