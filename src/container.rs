//! Recording container: open, validate, and address `.rrq` files.
//!
//! A [`Recording`] memory-maps the container read-only, validates the header
//! and the checksummed chunk table once at open time, and builds the chunk
//! index. Column payloads are only touched (and checksummed) when a query
//! actually decodes them.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

use crate::constants::{HEADER_SIZE, MAX_TABLE_BYTES};
use crate::error::{DecodeError, RequeryError, Result};
use crate::index::ChunkIndex;
use crate::io::header::{Header, HeaderCodec};
use crate::types::{ChunkRecord, ChunkTable, EntityPath};

/// Read-only handle on one recording container.
pub struct Recording {
    path: PathBuf,
    map: Mmap,
    header: Header,
    table: ChunkTable,
    index: ChunkIndex,
    decode_workers: usize,
}

/// Borrowed view of one chunk: its file-order position, owning entity path,
/// and table record.
#[derive(Debug, Clone, Copy)]
pub struct ChunkDescriptor<'a> {
    pub ordinal: usize,
    pub entity_path: &'a EntityPath,
    pub record: &'a ChunkRecord,
}

impl Recording {
    /// Open a recording, validating the header and chunk table.
    ///
    /// Fails fast on a missing file, bad magic, unsupported version, a table
    /// span outside the file, or a table checksum mismatch. Corruption inside
    /// individual chunk payloads is not checked here; it surfaces per chunk
    /// at query time.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                RequeryError::NotFound { path: path.clone() }
            } else {
                RequeryError::Io(err)
            }
        })?;
        // Safety: the map is read-only and stays valid after the file handle
        // is dropped.
        let map = unsafe { Mmap::map(&file)? };
        drop(file);

        let header = HeaderCodec::decode(&map)?;
        let table_bytes = Self::table_bytes(&map, &header)?;
        if *blake3::hash(table_bytes).as_bytes() != header.table_checksum {
            return Err(RequeryError::InvalidTable {
                reason: "chunk table checksum mismatch".to_string(),
            });
        }
        let table = ChunkTable::decode(table_bytes)?;
        let index = ChunkIndex::build(&table);
        debug!(
            path = %path.display(),
            chunks = table.chunks.len(),
            entities = index.entity_paths().len(),
            "opened recording"
        );

        Ok(Self {
            path,
            map,
            header,
            table,
            index,
            decode_workers: default_workers(),
        })
    }

    fn table_bytes<'m>(map: &'m Mmap, header: &Header) -> Result<&'m [u8]> {
        let invalid = |reason: String| RequeryError::InvalidTable { reason };

        if header.table_offset < HEADER_SIZE as u64 {
            return Err(invalid(format!(
                "chunk table offset {} overlaps the header",
                header.table_offset
            )));
        }
        if header.table_length > MAX_TABLE_BYTES {
            return Err(invalid(format!(
                "chunk table length {} exceeds the {MAX_TABLE_BYTES} byte limit",
                header.table_length
            )));
        }
        let end = header
            .table_offset
            .checked_add(header.table_length)
            .ok_or_else(|| invalid("chunk table span overflows".to_string()))?;
        if end > map.len() as u64 {
            return Err(invalid(format!(
                "chunk table span {}..{end} exceeds file length {}",
                header.table_offset,
                map.len()
            )));
        }

        let offset = usize::try_from(header.table_offset)
            .map_err(|_| invalid("chunk table offset does not fit in memory".to_string()))?;
        let length = usize::try_from(header.table_length)
            .map_err(|_| invalid("chunk table length does not fit in memory".to_string()))?;
        Ok(&map[offset..offset + length])
    }

    /// Path the recording was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn index(&self) -> &ChunkIndex {
        &self.index
    }

    /// Number of chunks in the container.
    #[must_use]
    pub fn num_chunks(&self) -> usize {
        self.table.chunks.len()
    }

    /// Descriptor for one chunk ordinal.
    #[must_use]
    pub fn descriptor(&self, ordinal: usize) -> Option<ChunkDescriptor<'_>> {
        self.table.chunks.get(ordinal).map(|record| ChunkDescriptor {
            ordinal,
            entity_path: self.index.path_of(ordinal),
            record,
        })
    }

    /// All chunk descriptors in file order.
    pub fn chunk_descriptors(&self) -> impl Iterator<Item = ChunkDescriptor<'_>> {
        self.table
            .chunks
            .iter()
            .enumerate()
            .map(|(ordinal, record)| ChunkDescriptor {
                ordinal,
                entity_path: self.index.path_of(ordinal),
                record,
            })
    }

    /// Descriptors of the chunks belonging to one entity path, in file order.
    pub fn chunks_for<'a>(
        &'a self,
        path: &EntityPath,
    ) -> impl Iterator<Item = ChunkDescriptor<'a>> {
        self.index.chunks_for(path).iter().filter_map(|&ordinal| {
            self.descriptor(ordinal)
        })
    }

    /// Number of worker threads used to decode matching chunks.
    #[must_use]
    pub fn decode_workers(&self) -> usize {
        self.decode_workers
    }

    /// Override the decode worker count. Clamped to at least one.
    pub fn set_decode_workers(&mut self, workers: usize) {
        self.decode_workers = workers.max(1);
    }

    /// Fetch and verify the stored bytes of one column span.
    pub(crate) fn column_bytes(
        &self,
        column: &str,
        offset: u64,
        length: u64,
        checksum: &[u8; 32],
    ) -> std::result::Result<&[u8], DecodeError> {
        let out_of_bounds = || DecodeError::OutOfBounds {
            column: column.to_string(),
            offset,
            length,
        };

        let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
        let len = usize::try_from(length).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
        let bytes = self.map.get(start..end).ok_or_else(out_of_bounds)?;

        if blake3::hash(bytes).as_bytes() != checksum {
            return Err(DecodeError::ChecksumMismatch {
                column: column.to_string(),
            });
        }
        Ok(bytes)
    }
}

impl std::fmt::Debug for Recording {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recording")
            .field("path", &self.path)
            .field("chunks", &self.table.chunks.len())
            .field("entities", &self.index.entity_paths().len())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "parallel_decode")]
fn default_workers() -> usize {
    num_cpus::get().max(1)
}

#[cfg(not(feature = "parallel_decode"))]
fn default_workers() -> usize {
    1
}
