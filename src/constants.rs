//! On-disk constants for the `.rrq` recording container.

/// Magic bytes at offset 0 of every recording container.
pub const MAGIC: [u8; 4] = *b"RRQ1";

/// Container format version accepted by this crate.
pub const SPEC_VERSION: u16 = 1;

/// Fixed header size in bytes.
pub const HEADER_SIZE: usize = 64;

/// Safety cap on the chunk table region; a table claiming more than this is
/// treated as corrupt rather than allocated.
pub const MAX_TABLE_BYTES: u64 = 512 * 1024 * 1024;

/// Upper bound on tensor rank accepted by the decoder.
pub const MAX_TENSOR_NDIM: u32 = 8;

/// Component tag carried by textual metadata chunks.
pub const TEXT_COMPONENT: &str = "text";

/// Component tag carried by action observation chunks.
pub const ACTION_COMPONENT: &str = "action";

/// Component tag carried by scalar observation chunks.
pub const SCALAR_COMPONENT: &str = "scalar";

/// Component tag carried by tensor observation chunks.
pub const TENSOR_COMPONENT: &str = "tensor";

/// Name of the data column holding the media type of a metadata chunk.
pub const MEDIA_TYPE_COLUMN: &str = "media_type";
