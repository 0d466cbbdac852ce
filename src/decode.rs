//! Column decoders: raw stored bytes to timestamps and typed cells.
//!
//! All errors here are chunk-scoped [`DecodeError`]s; the query layer skips
//! the offending chunk and keeps going. Every decoder checks that the column
//! yields exactly the chunk's recorded row count.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::constants::MAX_TENSOR_NDIM;
use crate::container::{ChunkDescriptor, Recording};
use crate::error::DecodeError;
use crate::types::{ColumnCompression, ColumnEncoding, DataCell, DataColumn, TensorData};

impl Recording {
    /// Decode every timeline column of a chunk, keyed by timeline name.
    pub(crate) fn extract_timelines(
        &self,
        descriptor: &ChunkDescriptor<'_>,
    ) -> Result<BTreeMap<String, Vec<i64>>, DecodeError> {
        let num_rows = descriptor.record.num_rows;
        let mut timelines = BTreeMap::new();
        for timeline in &descriptor.record.timelines {
            let bytes = self.column_bytes(
                &timeline.name,
                timeline.bytes_offset,
                timeline.bytes_length,
                &timeline.checksum,
            )?;
            timelines.insert(
                timeline.name.clone(),
                decode_timestamps(&timeline.name, bytes, num_rows)?,
            );
        }
        Ok(timelines)
    }

    /// Decode every data column of a chunk into exactly `num_rows` cells.
    ///
    /// A single column yields its cells directly; several columns yield one
    /// [`DataCell::Composite`] per row, preserving column order.
    pub(crate) fn materialize(
        &self,
        descriptor: &ChunkDescriptor<'_>,
    ) -> Result<Vec<DataCell>, DecodeError> {
        let num_rows = descriptor.record.num_rows;
        let mut columns: Vec<Vec<DataCell>> = descriptor
            .record
            .columns
            .iter()
            .map(|column| self.decode_column(column, num_rows))
            .collect::<Result<_, _>>()?;

        match columns.len() {
            0 => Ok(Vec::new()),
            1 => Ok(columns.swap_remove(0)),
            _ => {
                let rows = usize::try_from(num_rows).unwrap_or(usize::MAX);
                Ok((0..rows)
                    .map(|row| {
                        DataCell::Composite(
                            columns.iter().map(|cells| cells[row].clone()).collect(),
                        )
                    })
                    .collect())
            }
        }
    }

    pub(crate) fn decode_column(
        &self,
        column: &DataColumn,
        num_rows: u64,
    ) -> Result<Vec<DataCell>, DecodeError> {
        let stored = self.column_bytes(
            &column.name,
            column.bytes_offset,
            column.bytes_length,
            &column.checksum,
        )?;
        let bytes = decompress(&column.name, column.compression, stored)?;

        let encoding = ColumnEncoding::from_tag(column.encoding).ok_or_else(|| {
            DecodeError::UnknownEncoding {
                column: column.name.clone(),
                tag: column.encoding,
            }
        })?;
        match encoding {
            ColumnEncoding::Scalar => decode_scalars(&column.name, &bytes, num_rows),
            ColumnEncoding::Tensor => decode_tensors(&column.name, &bytes, num_rows),
            ColumnEncoding::Text => decode_texts(&column.name, &bytes, num_rows),
        }
    }
}

fn decompress<'a>(
    column: &str,
    tag: u8,
    stored: &'a [u8],
) -> Result<Cow<'a, [u8]>, DecodeError> {
    match ColumnCompression::from_tag(tag) {
        Some(ColumnCompression::None) => Ok(Cow::Borrowed(stored)),
        Some(ColumnCompression::Lz4) => lz4_flex::decompress_size_prepended(stored)
            .map(Cow::Owned)
            .map_err(|err| DecodeError::ShapeMismatch {
                column: column.to_string(),
                reason: format!("lz4 decompression failed: {err}"),
            }),
        None => Err(DecodeError::UnknownCompression {
            column: column.to_string(),
            tag,
        }),
    }
}

pub(crate) fn decode_timestamps(
    column: &str,
    bytes: &[u8],
    num_rows: u64,
) -> Result<Vec<i64>, DecodeError> {
    let expected = num_rows.checked_mul(8).ok_or_else(|| DecodeError::ShapeMismatch {
        column: column.to_string(),
        reason: "row count overflows".to_string(),
    })?;
    if bytes.len() as u64 != expected {
        return Err(DecodeError::ShapeMismatch {
            column: column.to_string(),
            reason: format!(
                "timeline holds {} bytes, expected {expected} for {num_rows} rows",
                bytes.len()
            ),
        });
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|raw| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(raw);
            i64::from_le_bytes(buf)
        })
        .collect())
}

fn decode_scalars(column: &str, bytes: &[u8], num_rows: u64) -> Result<Vec<DataCell>, DecodeError> {
    let expected = num_rows.checked_mul(8).ok_or_else(|| DecodeError::ShapeMismatch {
        column: column.to_string(),
        reason: "row count overflows".to_string(),
    })?;
    if bytes.len() as u64 != expected {
        return Err(DecodeError::ShapeMismatch {
            column: column.to_string(),
            reason: format!(
                "scalar column holds {} bytes, expected {expected} for {num_rows} rows",
                bytes.len()
            ),
        });
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|raw| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(raw);
            DataCell::Scalar(f64::from_le_bytes(buf))
        })
        .collect())
}

/// Sequential reader over one column's decoded bytes.
struct ColumnCursor<'a> {
    column: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ColumnCursor<'a> {
    fn new(column: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            column,
            bytes,
            pos: 0,
        }
    }

    fn truncated(&self, reason: &str) -> DecodeError {
        DecodeError::ShapeMismatch {
            column: self.column.to_string(),
            reason: format!("{reason} at byte {}", self.pos),
        }
    }

    fn read_exact(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| self.truncated("length overflows"))?;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| self.truncated("column truncated"))?;
        self.pos = end;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let raw = self.read_exact(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(raw);
        Ok(u32::from_le_bytes(buf))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

fn decode_tensors(column: &str, bytes: &[u8], num_rows: u64) -> Result<Vec<DataCell>, DecodeError> {
    let mut cursor = ColumnCursor::new(column, bytes);
    let mut cells = Vec::with_capacity(usize::try_from(num_rows).unwrap_or(0));
    for _ in 0..num_rows {
        let ndim = cursor.read_u32()?;
        if ndim > MAX_TENSOR_NDIM {
            return Err(DecodeError::ShapeMismatch {
                column: column.to_string(),
                reason: format!("tensor rank {ndim} exceeds the limit of {MAX_TENSOR_NDIM}"),
            });
        }
        let mut shape = Vec::with_capacity(ndim as usize);
        let mut num_elements: usize = 1;
        for _ in 0..ndim {
            let dim = cursor.read_u32()?;
            num_elements = num_elements
                .checked_mul(dim as usize)
                .ok_or_else(|| DecodeError::ShapeMismatch {
                    column: column.to_string(),
                    reason: format!("tensor shape {shape:?} x {dim} overflows"),
                })?;
            shape.push(dim);
        }
        let payload_len =
            num_elements
                .checked_mul(8)
                .ok_or_else(|| DecodeError::ShapeMismatch {
                    column: column.to_string(),
                    reason: format!("tensor of {num_elements} elements overflows"),
                })?;
        let values = cursor
            .read_exact(payload_len)?
            .chunks_exact(8)
            .map(|raw| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(raw);
                f64::from_le_bytes(buf)
            })
            .collect();
        cells.push(DataCell::Tensor(TensorData { shape, values }));
    }
    if cursor.remaining() != 0 {
        return Err(DecodeError::ShapeMismatch {
            column: column.to_string(),
            reason: format!(
                "{} trailing bytes after {num_rows} tensor rows",
                cursor.remaining()
            ),
        });
    }
    Ok(cells)
}

fn decode_texts(column: &str, bytes: &[u8], num_rows: u64) -> Result<Vec<DataCell>, DecodeError> {
    let mut cursor = ColumnCursor::new(column, bytes);
    let mut cells = Vec::with_capacity(usize::try_from(num_rows).unwrap_or(0));
    for row in 0..num_rows {
        let len = cursor.read_u32()?;
        let raw = cursor.read_exact(len as usize)?;
        let text = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidText {
            column: column.to_string(),
            row,
        })?;
        cells.push(DataCell::Text(text.to_owned()));
    }
    if cursor.remaining() != 0 {
        return Err(DecodeError::ShapeMismatch {
            column: column.to_string(),
            reason: format!(
                "{} trailing bytes after {num_rows} text rows",
                cursor.remaining()
            ),
        });
    }
    Ok(cells)
}
