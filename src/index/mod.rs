//! Read-only vector index and its metadata sidecar
//!
//! - `flat`: exhaustive squared-L2 index and its on-disk format
//! - `metadata`: chunk records aligned with index rows
//! - `corpus`: index + metadata pair loaded at startup

pub mod corpus;
pub mod flat;
pub mod metadata;

pub use corpus::CourseIndex;
pub use flat::FlatL2Index;
pub use metadata::ChunkMetadata;

use crate::errors::Result;

/// Search hit: row position and squared L2 distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Nearest-neighbor search over fixed-dimension vectors.
///
/// Implementations are immutable once built and return at most `k`
/// neighbors in ascending distance order.
pub trait VectorIndex: Send + Sync {
    /// Vector dimension fixed at build time
    fn dimension(&self) -> usize;

    /// Number of stored vectors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `k` nearest rows to `query`, closest first
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}
