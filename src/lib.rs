#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(test, allow(clippy::float_cmp, clippy::cast_possible_truncation))]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: internal helpers are largely self-documenting; public
// APIs still carry proper docs.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Casts between the on-disk u64 spans and in-memory usize indices are bounds
// checked at the call sites that matter.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::unreadable_literal)]

//! Query engine for chunked `.rrq` recording containers.
//!
//! A recording is a single file: a fixed header, column payloads addressed
//! by byte span, and a checksummed chunk table. [`Recording::open`] validates
//! the container and indexes its chunks by entity path and component tag;
//! the query operations then decode only the columns a filter selects.

/// The requery crate version (matches `Cargo.toml`).
pub const REQUERY_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod constants;
pub mod container;
mod decode;
pub mod error;
pub mod filter;
pub mod index;
pub mod io;
pub mod query;
pub mod types;

#[cfg(test)]
mod tests_query;

pub use container::{ChunkDescriptor, Recording};
pub use error::{DecodeError, RequeryError, Result};
pub use filter::{ComponentFilter, PathFilter};
pub use index::ChunkIndex;
pub use query::{
    list_entity_paths, query_action_entities, query_data_entities, query_meta_entities,
};
pub use types::{
    ChunkFailure, ChunkRecord, ChunkTable, DataCell, DataChunk, DataResponse, EntityPath,
    MetaChunk, MetaResponse, TensorData,
};

/// Bincode configuration shared by the chunk table codec: fixed-width
/// integers, little-endian, matching the rest of the byte layout.
pub(crate) fn table_config() -> impl bincode::config::Config {
    bincode::config::standard()
        .with_fixed_int_encoding()
        .with_little_endian()
}
