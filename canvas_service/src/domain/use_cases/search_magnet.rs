use std::sync::Arc;

use common::{dtos::magnet_partition::MagnetPartitionDto, helper::error_chain_fmt};
use tracing::info;

use crate::{
    configuration::SimilaritySettings,
    domain::services::{coordinates_assigner::CoordinatesAssigner, similarity::magnet_partition},
    ports::{
        artifact_repository::{ArtifactRepository, ArtifactRepositoryError},
        vector_index::{VectorIndex, VectorIndexError},
    },
};

pub struct SearchMagnetRequest {
    pub query: String,
    pub room_id: String,
}

/// Splits a room between the artifacts close in meaning to a free-text query and the others
pub struct SearchMagnetUseCase {
    artifact_repository: Arc<dyn ArtifactRepository>,
    vector_index: Arc<dyn VectorIndex>,
    coordinates_assigner: Arc<CoordinatesAssigner>,
    top_k: usize,
    distance_threshold: f32,
}

impl SearchMagnetUseCase {
    pub fn new(
        artifact_repository: Arc<dyn ArtifactRepository>,
        vector_index: Arc<dyn VectorIndex>,
        coordinates_assigner: Arc<CoordinatesAssigner>,
        settings: &SimilaritySettings,
    ) -> Self {
        Self {
            artifact_repository,
            vector_index,
            coordinates_assigner,
            top_k: settings.magnet_top_k,
            distance_threshold: settings.magnet_distance_threshold,
        }
    }

    #[tracing::instrument(name = "Magnet search use case", skip(self, request), fields(room_id = %request.room_id))]
    pub async fn execute(
        &self,
        request: &SearchMagnetRequest,
    ) -> Result<MagnetPartitionDto, SearchMagnetError> {
        let query = self
            .coordinates_assigner
            .embed_or_neutral(&request.query)
            .await;

        let neighbors = self
            .vector_index
            .knn(&query, &request.room_id, self.top_k)
            .await?;

        let mut artifacts = self.artifact_repository.get_all(&request.room_id).await?;
        artifacts.sort_by_key(|artifact| artifact.order);

        let partition = magnet_partition(
            artifacts.iter().map(|artifact| artifact.id.as_str()),
            &neighbors,
            self.distance_threshold,
        );
        info!(
            matched = partition.matched.len(),
            not_matched = partition.no_match.len(),
            "Magnet applied"
        );

        Ok(partition)
    }
}

#[derive(thiserror::Error)]
pub enum SearchMagnetError {
    #[error(transparent)]
    ArtifactRepositoryError(#[from] ArtifactRepositoryError),
    #[error(transparent)]
    VectorIndexError(#[from] VectorIndexError),
}

impl std::fmt::Debug for SearchMagnetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
