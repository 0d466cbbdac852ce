//! Public types exposed by the `requery` crate.

pub mod cell;
pub mod chunk;
pub mod path;
pub mod query;

pub use cell::{DataCell, TensorData};
pub use chunk::{
    ChunkRecord, ChunkTable, ColumnCompression, ColumnEncoding, DataColumn, TimelineColumn,
};
pub use path::EntityPath;
pub use query::{ChunkFailure, DataChunk, DataResponse, MetaChunk, MetaResponse};
