use std::sync::Arc;

use tracing::warn;

use crate::{
    configuration::CoordinatesMode,
    domain::entities::{artifact::Component, coordinates::Coordinates},
    ports::embedding_service::EmbeddingService,
};

/// Places texts and new artifacts in the semantic space
pub struct CoordinatesAssigner {
    mode: CoordinatesMode,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl CoordinatesAssigner {
    pub fn new(mode: CoordinatesMode, embedding_service: Arc<dyn EmbeddingService>) -> Self {
        Self {
            mode,
            embedding_service,
        }
    }

    /// Coordinates of a component about to be stored, depending on the configured mode
    pub async fn assign(&self, component: &Component) -> Coordinates {
        match self.mode {
            CoordinatesMode::Random => Coordinates::placeholder(),
            CoordinatesMode::Embedding => self.embed_or_neutral(&component.semantic_text()).await,
        }
    }

    /// Embeds a text, falling back to the neutral vector if the embedding fails
    #[tracing::instrument(name = "Embedding text", skip(self))]
    pub async fn embed_or_neutral(&self, text: &str) -> Coordinates {
        match self.embedding_service.embed(text).await {
            Ok(coordinates) => Coordinates::from_lossy(coordinates.into()),
            Err(error) => {
                warn!(?error, "Embedding failed, using the neutral vector");
                Coordinates::neutral()
            }
        }
    }
}
