//! Course index: vector rows paired positionally with chunk metadata

use std::path::Path;
use tracing::{debug, info};

use crate::errors::{Result, TutorError};
use crate::index::flat::FlatL2Index;
use crate::index::metadata::{load_metadata, ChunkMetadata};
use crate::index::{Neighbor, VectorIndex};

/// Vector index plus its metadata sidecar.
///
/// Row `i` of the index describes `metadata[i]`; construction fails when
/// the counts differ.
pub struct CourseIndex {
    index: Box<dyn VectorIndex>,
    metadata: Vec<ChunkMetadata>,
}

impl std::fmt::Debug for CourseIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseIndex")
            .field("dimension", &self.index.dimension())
            .field("vectors", &self.index.len())
            .field("metadata", &self.metadata.len())
            .finish()
    }
}

impl CourseIndex {
    pub fn new(index: Box<dyn VectorIndex>, metadata: Vec<ChunkMetadata>) -> Result<Self> {
        if index.len() != metadata.len() {
            return Err(TutorError::MetadataMismatch {
                vectors: index.len(),
                metadata: metadata.len(),
            });
        }
        Ok(Self { index, metadata })
    }

    /// Load the flat index file and its sidecar; both must exist
    pub fn load(index_path: &Path, metadata_path: &Path) -> Result<Self> {
        let index = FlatL2Index::load(index_path)?;
        let metadata = load_metadata(metadata_path)?;
        info!(
            vectors = index.len(),
            dimension = index.dimension(),
            "Loaded course index"
        );
        Self::new(Box::new(index), metadata)
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    pub fn metadata(&self) -> &[ChunkMetadata] {
        &self.metadata
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.index.search(query, k)
    }

    /// Chunk texts for the nearest rows, closest first.
    ///
    /// Positions without a metadata record are skipped.
    pub fn nearest_texts(&self, query: &[f32], k: usize) -> Result<Vec<&str>> {
        let neighbors = self.search(query, k)?;
        let texts = neighbors
            .iter()
            .filter_map(|neighbor| match self.metadata.get(neighbor.position) {
                Some(record) => Some(record.chunk_text.as_str()),
                None => {
                    debug!(position = neighbor.position, "Skipping out-of-range index position");
                    None
                }
            })
            .collect();
        Ok(texts)
    }

    /// Distinct source documents in the index
    pub fn source_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.metadata.iter().map(|m| m.filename.as_str()).collect();
        files.sort_unstable();
        files.dedup();
        files
    }
}
