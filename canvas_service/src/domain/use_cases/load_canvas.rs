use std::sync::Arc;

use crate::{
    domain::entities::artifact::Artifact,
    ports::artifact_repository::{ArtifactRepository, ArtifactRepositoryError},
};

pub struct LoadCanvasUseCase {
    artifact_repository: Arc<dyn ArtifactRepository>,
}

impl LoadCanvasUseCase {
    pub fn new(artifact_repository: Arc<dyn ArtifactRepository>) -> Self {
        Self {
            artifact_repository,
        }
    }

    /// Every artifact of the room, by ascending order
    #[tracing::instrument(name = "Loading canvas use case", skip(self))]
    pub async fn execute(&self, room_id: &str) -> Result<Vec<Artifact>, ArtifactRepositoryError> {
        let mut artifacts = self.artifact_repository.get_all(room_id).await?;
        artifacts.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(artifacts)
    }
}
