use std::sync::Arc;

use common::{helper::error_chain_fmt, telemetry::spawn_blocking_with_tracing};
use tracing::warn;

use crate::{
    configuration::SimilaritySettings,
    domain::{entities::similarity_pair::SimilarityPair, services::similarity::gravity_pairs},
    ports::artifact_repository::{ArtifactRepository, ArtifactRepositoryError},
};

/// Lists the pairs of artifacts of a room similar enough to attract each other
pub struct ComputeSimilaritiesUseCase {
    artifact_repository: Arc<dyn ArtifactRepository>,
    gravity_threshold: f32,
    large_room_warning: usize,
}

impl ComputeSimilaritiesUseCase {
    pub fn new(artifact_repository: Arc<dyn ArtifactRepository>, settings: &SimilaritySettings) -> Self {
        Self {
            artifact_repository,
            gravity_threshold: settings.gravity_threshold,
            large_room_warning: settings.large_room_warning,
        }
    }

    #[tracing::instrument(name = "Computing similarities use case", skip(self))]
    pub async fn execute(
        &self,
        room_id: &str,
    ) -> Result<Vec<SimilarityPair>, ComputeSimilaritiesError> {
        let artifacts = self.artifact_repository.get_all(room_id).await?;
        if artifacts.len() < 2 {
            return Ok(vec![]);
        }

        if artifacts.len() > self.large_room_warning {
            warn!(
                artifacts = artifacts.len(),
                "Large room, comparing every pair of artifacts may be slow"
            );
        }

        // Quadratic in the room size, kept off the async workers
        let threshold = self.gravity_threshold;
        let pairs = spawn_blocking_with_tracing(move || gravity_pairs(&artifacts, threshold))
            .await
            .map_err(|e| ComputeSimilaritiesError::ComputationAborted(e.to_string()))?;

        Ok(pairs)
    }
}

#[derive(thiserror::Error)]
pub enum ComputeSimilaritiesError {
    #[error(transparent)]
    ArtifactRepositoryError(#[from] ArtifactRepositoryError),
    #[error("Similarity computation aborted: {0}")]
    ComputationAborted(String),
}

impl std::fmt::Debug for ComputeSimilaritiesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
