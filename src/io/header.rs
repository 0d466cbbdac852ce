//! Fixed-size header codec for `.rrq` recording containers.
//!
//! Header layout (64 bytes, little-endian):
//! `[magic: 4][version: u16][reserved: 2][table_offset: u64][table_length: u64]`
//! `[table_checksum: 32][reserved: 8]`

use crate::constants::{HEADER_SIZE, MAGIC, SPEC_VERSION};
use crate::error::{RequeryError, Result};

/// Decoded container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u16,
    /// Byte offset of the encoded chunk table.
    pub table_offset: u64,
    /// Byte length of the encoded chunk table.
    pub table_length: u64,
    /// blake3 checksum of the encoded chunk table bytes.
    pub table_checksum: [u8; 32],
}

pub struct HeaderCodec;

impl HeaderCodec {
    /// Decode and validate the header at the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Header> {
        let invalid = |reason: &str| RequeryError::InvalidHeader {
            reason: reason.to_string(),
        };

        if bytes.len() < HEADER_SIZE {
            return Err(invalid("file too small to contain a header"));
        }

        let magic: [u8; 4] = bytes[0..4]
            .try_into()
            .map_err(|_| invalid("unreadable magic"))?;
        if magic != MAGIC {
            return Err(RequeryError::InvalidHeader {
                reason: format!("bad magic {magic:02x?}"),
            });
        }

        let version = u16::from_le_bytes(
            bytes[4..6]
                .try_into()
                .map_err(|_| invalid("unreadable version"))?,
        );
        if version != SPEC_VERSION {
            return Err(RequeryError::InvalidHeader {
                reason: format!("unsupported container version {version}"),
            });
        }

        let read_u64 = |range: std::ops::Range<usize>, context: &str| -> Result<u64> {
            let slice = bytes.get(range).ok_or_else(|| invalid(context))?;
            let array: [u8; 8] = slice.try_into().map_err(|_| invalid(context))?;
            Ok(u64::from_le_bytes(array))
        };

        let table_offset = read_u64(8..16, "unreadable table offset")?;
        let table_length = read_u64(16..24, "unreadable table length")?;
        let table_checksum: [u8; 32] = bytes[24..56]
            .try_into()
            .map_err(|_| invalid("unreadable table checksum"))?;

        Ok(Header {
            magic,
            version,
            table_offset,
            table_length,
            table_checksum,
        })
    }

    /// Encode a header into its fixed 64-byte form.
    #[cfg(test)]
    #[must_use]
    pub fn encode(header: &Header) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&header.magic);
        bytes[4..6].copy_from_slice(&header.version.to_le_bytes());
        bytes[8..16].copy_from_slice(&header.table_offset.to_le_bytes());
        bytes[16..24].copy_from_slice(&header.table_length.to_le_bytes());
        bytes[24..56].copy_from_slice(&header.table_checksum);
        bytes
    }
}
