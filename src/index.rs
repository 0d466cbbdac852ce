//! Chunk index: entity-path grouping and filtered selection.
//!
//! Built once when a recording is opened and cached on the handle. Groups
//! chunk ordinals by entity path, preserving first-seen file order both
//! across entities and across chunks within an entity.

use std::collections::HashMap;

use crate::filter::{ComponentFilter, PathFilter};
use crate::types::{ChunkTable, EntityPath};

#[derive(Debug, Clone)]
struct IndexedChunk {
    path_id: usize,
    components: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ChunkIndex {
    /// Distinct entity paths in first-seen file order.
    paths: Vec<EntityPath>,
    /// Chunk ordinals per path id, in file order.
    per_path: Vec<Vec<usize>>,
    /// Per-chunk metadata, indexed by ordinal.
    chunks: Vec<IndexedChunk>,
    by_path: HashMap<EntityPath, usize>,
}

impl ChunkIndex {
    #[must_use]
    pub fn build(table: &ChunkTable) -> Self {
        let mut index = Self::default();
        for record in &table.chunks {
            let path = EntityPath::parse(&record.entity_path);
            let path_id = match index.by_path.get(&path) {
                Some(&id) => id,
                None => {
                    let id = index.paths.len();
                    index.by_path.insert(path.clone(), id);
                    index.paths.push(path);
                    index.per_path.push(Vec::new());
                    id
                }
            };
            let ordinal = index.chunks.len();
            index.per_path[path_id].push(ordinal);
            index.chunks.push(IndexedChunk {
                path_id,
                components: record.components.clone(),
            });
        }
        index
    }

    /// Distinct entity paths, each exactly once, in first-seen file order.
    #[must_use]
    pub fn entity_paths(&self) -> &[EntityPath] {
        &self.paths
    }

    /// Number of chunks in the container.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Ordinals of the chunks belonging to `path`, in file order. Unknown
    /// paths yield an empty slice.
    #[must_use]
    pub fn chunks_for(&self, path: &EntityPath) -> &[usize] {
        self.by_path
            .get(path)
            .map_or(&[][..], |&id| self.per_path[id].as_slice())
    }

    /// Ordinals of the chunks matching both filters, in file order.
    #[must_use]
    pub fn chunks_matching(
        &self,
        path_filter: &PathFilter,
        component_filter: &ComponentFilter,
    ) -> Vec<usize> {
        // Evaluate the path filter once per distinct entity, not per chunk.
        let path_ok: Vec<bool> = self
            .paths
            .iter()
            .map(|path| path_filter.matches(path))
            .collect();
        self.chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| {
                path_ok[chunk.path_id] && component_filter.matches(&chunk.components)
            })
            .map(|(ordinal, _)| ordinal)
            .collect()
    }

    pub(crate) fn path_of(&self, ordinal: usize) -> &EntityPath {
        &self.paths[self.chunks[ordinal].path_id]
    }
}
