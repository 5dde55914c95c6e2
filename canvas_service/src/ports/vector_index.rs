use async_trait::async_trait;
use common::helper::error_chain_fmt;

use crate::domain::entities::coordinates::{Coordinates, INDEX_SCHEMA_VERSION};

/// An artifact returned by a nearest-neighbor search.
///
/// `distance` is the cosine distance: 0 for identical directions, up to 2 for opposite ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub id: String,
    pub distance: f32,
}

/// Name of the index for the current schema version.
///
/// Bumping the version gives a new name, so the next `build` creates a fresh index
/// instead of reusing one with another schema.
pub fn versioned_index_name(prefix: &str) -> String {
    format!("{}_v{}", prefix, INDEX_SCHEMA_VERSION)
}

/// Nearest-neighbor structure over the coordinates of every artifact.
///
/// One index for the whole deployment, rooms are filtered at query time.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Creates the index if it does not exist yet, a no-op otherwise
    async fn build(&self) -> Result<(), VectorIndexError>;

    async fn upsert(
        &self,
        room_id: &str,
        id: &str,
        coordinates: &Coordinates,
    ) -> Result<(), VectorIndexError>;

    /// At most `k` artifacts of the room, by ascending cosine distance to `query`
    async fn knn(
        &self,
        query: &Coordinates,
        room_id: &str,
        k: usize,
    ) -> Result<Vec<Neighbor>, VectorIndexError>;
}

#[derive(thiserror::Error)]
pub enum VectorIndexError {
    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Unexpected vector index response: {0}")]
    InvalidResponse(String),
}

impl std::fmt::Debug for VectorIndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
