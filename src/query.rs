//! Query operations over an open recording.
//!
//! Four operations: list entity paths, metadata queries, data queries, and
//! action queries (a data query pinned to the action component tag). Chunks
//! that fail to decode are skipped with a warning and reported in the
//! response; an empty match is a success, never an error.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::warn;

use crate::constants::{ACTION_COMPONENT, MEDIA_TYPE_COLUMN, TEXT_COMPONENT};
use crate::container::{ChunkDescriptor, Recording};
use crate::error::{DecodeError, Result};
use crate::filter::{ComponentFilter, PathFilter};
use crate::types::{
    ChunkFailure, ColumnEncoding, DataCell, DataChunk, DataResponse, EntityPath, MetaChunk,
    MetaResponse,
};

/// One fully decoded chunk, prior to per-entity aggregation.
struct DecodedChunk {
    ordinal: usize,
    entity_path: EntityPath,
    timelines: BTreeMap<String, Vec<i64>>,
    data: Vec<DataCell>,
}

impl Recording {
    /// Distinct entity paths in the container, each exactly once, in
    /// first-seen file order.
    #[must_use]
    pub fn entity_paths(&self) -> &[EntityPath] {
        self.index().entity_paths()
    }

    /// Decode the textual annotations of every entity matching `path_filter`.
    pub fn query_meta(&self, path_filter: &PathFilter) -> Result<MetaResponse> {
        let component_filter = ComponentFilter::new(TEXT_COMPONENT);
        let mut response = MetaResponse::default();
        // Group annotations by entity in first-seen file order, then by
        // chunk file order and row index within the entity.
        let mut slots: HashMap<EntityPath, usize> = HashMap::new();
        let mut grouped: Vec<Vec<MetaChunk>> = Vec::new();
        for ordinal in self.index().chunks_matching(path_filter, &component_filter) {
            let descriptor = match self.descriptor(ordinal) {
                Some(descriptor) => descriptor,
                None => continue,
            };
            match self.meta_rows(&descriptor) {
                Ok(rows) => {
                    let slot = match slots.get(descriptor.entity_path) {
                        Some(&slot) => slot,
                        None => {
                            let slot = grouped.len();
                            slots.insert(descriptor.entity_path.clone(), slot);
                            grouped.push(Vec::new());
                            slot
                        }
                    };
                    grouped[slot].extend(rows);
                }
                Err(error) => {
                    warn!(
                        entity = %descriptor.entity_path,
                        ordinal,
                        %error,
                        "skipping undecodable metadata chunk"
                    );
                    response.skipped.push(ChunkFailure {
                        entity_path: descriptor.entity_path.clone(),
                        ordinal,
                        error,
                    });
                }
            }
        }
        response.chunks = grouped.into_iter().flatten().collect();
        Ok(response)
    }

    fn meta_rows(
        &self,
        descriptor: &ChunkDescriptor<'_>,
    ) -> std::result::Result<Vec<MetaChunk>, DecodeError> {
        let record = descriptor.record;
        let is_text =
            |tag: u8| ColumnEncoding::from_tag(tag) == Some(ColumnEncoding::Text);

        let text_column = record
            .columns
            .iter()
            .find(|column| column.name != MEDIA_TYPE_COLUMN && is_text(column.encoding));
        let Some(text_column) = text_column else {
            return Ok(Vec::new());
        };
        let texts = self.decode_column(text_column, record.num_rows)?;

        let media_types = record
            .columns
            .iter()
            .find(|column| column.name == MEDIA_TYPE_COLUMN && is_text(column.encoding))
            .map(|column| self.decode_column(column, record.num_rows))
            .transpose()?;

        Ok(texts
            .into_iter()
            .enumerate()
            .map(|(row, cell)| {
                let text = match cell {
                    DataCell::Text(text) => text,
                    other => format!("{other:?}"),
                };
                let media_type = media_types.as_ref().and_then(|cells| match cells.get(row) {
                    Some(DataCell::Text(media)) if !media.is_empty() => Some(media.clone()),
                    _ => None,
                });
                MetaChunk {
                    entity_path: descriptor.entity_path.clone(),
                    media_type,
                    text,
                }
            })
            .collect())
    }

    /// Decode and aggregate the data of every chunk matching both filters.
    ///
    /// Returns one [`DataChunk`] per matching entity path in first-seen file
    /// order. Within an entity, timelines and cells are concatenated in
    /// chunk file order, then row order.
    pub fn query_data(
        &self,
        component_filter: &ComponentFilter,
        path_filter: &PathFilter,
    ) -> Result<DataResponse> {
        let ordinals = self.index().chunks_matching(path_filter, component_filter);
        let (decoded, skipped) = self.decode_selection(ordinals);
        Ok(DataResponse {
            chunks: group_by_entity(decoded),
            skipped,
        })
    }

    /// Data query pinned to action-tagged chunks.
    pub fn query_actions(&self, path_filter: &PathFilter) -> Result<DataResponse> {
        self.query_data(&ComponentFilter::new(ACTION_COMPONENT), path_filter)
    }

    fn decode_chunk(
        &self,
        descriptor: ChunkDescriptor<'_>,
    ) -> std::result::Result<DecodedChunk, ChunkFailure> {
        let decode = || -> std::result::Result<DecodedChunk, DecodeError> {
            Ok(DecodedChunk {
                ordinal: descriptor.ordinal,
                entity_path: descriptor.entity_path.clone(),
                timelines: self.extract_timelines(&descriptor)?,
                data: self.materialize(&descriptor)?,
            })
        };
        decode().map_err(|error| {
            warn!(
                entity = %descriptor.entity_path,
                ordinal = descriptor.ordinal,
                %error,
                "skipping undecodable chunk"
            );
            ChunkFailure {
                entity_path: descriptor.entity_path.clone(),
                ordinal: descriptor.ordinal,
                error,
            }
        })
    }

    #[cfg(not(feature = "parallel_decode"))]
    fn decode_selection(&self, ordinals: Vec<usize>) -> (Vec<DecodedChunk>, Vec<ChunkFailure>) {
        let mut decoded = Vec::with_capacity(ordinals.len());
        let mut skipped = Vec::new();
        for descriptor in ordinals.into_iter().filter_map(|o| self.descriptor(o)) {
            match self.decode_chunk(descriptor) {
                Ok(chunk) => decoded.push(chunk),
                Err(failure) => skipped.push(failure),
            }
        }
        (decoded, skipped)
    }

    /// Decode the selected chunks on a worker pool, then restore file order.
    #[cfg(feature = "parallel_decode")]
    fn decode_selection(&self, ordinals: Vec<usize>) -> (Vec<DecodedChunk>, Vec<ChunkFailure>) {
        let workers = self.decode_workers().min(ordinals.len().max(1));
        if workers <= 1 || ordinals.len() <= 1 {
            let mut decoded = Vec::with_capacity(ordinals.len());
            let mut skipped = Vec::new();
            for descriptor in ordinals.into_iter().filter_map(|o| self.descriptor(o)) {
                match self.decode_chunk(descriptor) {
                    Ok(chunk) => decoded.push(chunk),
                    Err(failure) => skipped.push(failure),
                }
            }
            return (decoded, skipped);
        }

        let (task_tx, task_rx) = crossbeam_channel::unbounded::<ChunkDescriptor<'_>>();
        let (result_tx, result_rx) =
            crossbeam_channel::unbounded::<std::result::Result<DecodedChunk, ChunkFailure>>();
        for descriptor in ordinals.into_iter().filter_map(|o| self.descriptor(o)) {
            // Receivers outlive this loop, so sends cannot fail.
            let _ = task_tx.send(descriptor);
        }
        drop(task_tx);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    while let Ok(descriptor) = task_rx.recv() {
                        let _ = result_tx.send(self.decode_chunk(descriptor));
                    }
                });
            }
        });
        drop(result_tx);

        let mut decoded = Vec::new();
        let mut skipped = Vec::new();
        while let Ok(result) = result_rx.recv() {
            match result {
                Ok(chunk) => decoded.push(chunk),
                Err(failure) => skipped.push(failure),
            }
        }
        decoded.sort_by_key(|chunk| chunk.ordinal);
        skipped.sort_by_key(|failure| failure.ordinal);
        (decoded, skipped)
    }
}

/// Fold decoded chunks into one aggregate per entity, in first-seen order.
fn group_by_entity(decoded: Vec<DecodedChunk>) -> Vec<DataChunk> {
    let mut slots: HashMap<EntityPath, usize> = HashMap::new();
    let mut chunks: Vec<DataChunk> = Vec::new();
    for chunk in decoded {
        let slot = match slots.get(&chunk.entity_path) {
            Some(&slot) => slot,
            None => {
                let slot = chunks.len();
                slots.insert(chunk.entity_path.clone(), slot);
                chunks.push(DataChunk {
                    entity_path: chunk.entity_path,
                    timelines: BTreeMap::new(),
                    data: Vec::new(),
                });
                slot
            }
        };
        let aggregate = &mut chunks[slot];
        for (name, mut timestamps) in chunk.timelines {
            aggregate
                .timelines
                .entry(name)
                .or_default()
                .append(&mut timestamps);
        }
        aggregate.data.extend(chunk.data);
    }
    chunks
}

/// One-shot listing of the entity paths in a recording file.
pub fn list_entity_paths<P: AsRef<Path>>(path: P) -> Result<Vec<EntityPath>> {
    let recording = Recording::open(path)?;
    Ok(recording.entity_paths().to_vec())
}

/// One-shot metadata query against a recording file.
pub fn query_meta_entities<P: AsRef<Path>>(path: P, path_pattern: &str) -> Result<MetaResponse> {
    let recording = Recording::open(path)?;
    recording.query_meta(&PathFilter::new(path_pattern))
}

/// One-shot data query against a recording file.
pub fn query_data_entities<P: AsRef<Path>>(
    path: P,
    component_pattern: &str,
    path_pattern: &str,
) -> Result<DataResponse> {
    let recording = Recording::open(path)?;
    recording.query_data(
        &ComponentFilter::new(component_pattern),
        &PathFilter::new(path_pattern),
    )
}

/// One-shot action query against a recording file.
pub fn query_action_entities<P: AsRef<Path>>(path: P, path_pattern: &str) -> Result<DataResponse> {
    let recording = Recording::open(path)?;
    recording.query_actions(&PathFilter::new(path_pattern))
}
