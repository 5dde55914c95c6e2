use async_trait::async_trait;
use common::helper::error_chain_fmt;

use crate::domain::entities::coordinates::Coordinates;

/// Maps a text to its position in the semantic space
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Coordinates, EmbeddingError>;
}

#[derive(thiserror::Error)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    RequestFailed(String),

    #[error("Embedding output is not a vector: {0}")]
    InvalidVector(String),
}

impl std::fmt::Debug for EmbeddingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
