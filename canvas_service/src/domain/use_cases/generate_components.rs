use std::sync::Arc;

use common::helper::error_chain_fmt;
use tracing::{info, warn};

use crate::{
    domain::{
        entities::{
            artifact::{Artifact, GeneratedComponent},
            coordinates::Coordinates,
        },
        services::{coordinates_assigner::CoordinatesAssigner, room_sequencer::RoomSequencer},
    },
    ports::{
        artifact_repository::{ArtifactRepository, ArtifactRepositoryError},
        component_generator::ComponentGenerator,
        vector_index::{VectorIndex, VectorIndexError},
    },
    realtime::{events, room_registry::RoomRegistry},
};

pub struct GenerateComponentsRequest {
    pub prompt: String,
    pub room_id: String,
}

/// Appends a generated batch of components to the timeline of a room
pub struct GenerateComponentsUseCase {
    artifact_repository: Arc<dyn ArtifactRepository>,
    vector_index: Arc<dyn VectorIndex>,
    component_generator: Arc<dyn ComponentGenerator>,
    coordinates_assigner: Arc<CoordinatesAssigner>,
    room_sequencer: Arc<RoomSequencer>,
    room_registry: Arc<RoomRegistry>,
}

impl GenerateComponentsUseCase {
    pub fn new(
        artifact_repository: Arc<dyn ArtifactRepository>,
        vector_index: Arc<dyn VectorIndex>,
        component_generator: Arc<dyn ComponentGenerator>,
        coordinates_assigner: Arc<CoordinatesAssigner>,
        room_sequencer: Arc<RoomSequencer>,
        room_registry: Arc<RoomRegistry>,
    ) -> Self {
        Self {
            artifact_repository,
            vector_index,
            component_generator,
            coordinates_assigner,
            room_sequencer,
            room_registry,
        }
    }

    /// Generates, stores and indexes a batch, then returns the whole timeline of the room.
    ///
    /// Artifacts are written one at a time: if a write fails, the artifacts
    /// written before it stay in the room.
    #[tracing::instrument(name = "Generating components use case", skip(self, request), fields(room_id = %request.room_id))]
    pub async fn execute(
        &self,
        request: &GenerateComponentsRequest,
    ) -> Result<Vec<Artifact>, GenerateComponentsError> {
        let room_id = request.room_id.as_str();
        let _room_guard = self.room_sequencer.lock(room_id).await;

        let existing = self.artifact_repository.get_all(room_id).await?;
        let start_order = Artifact::next_order(&existing);

        let artifacts = match self
            .component_generator
            .generate_components(&request.prompt, start_order)
            .await
        {
            Ok(generated) => self.place_batch(room_id, start_order, generated).await,
            Err(error) => {
                warn!(?error, "Generation failed, adding a failure card instead");
                let mut failure =
                    Artifact::generation_failure(room_id, start_order, Coordinates::neutral());
                failure.coordinates = self.coordinates_assigner.assign(&failure.component).await;
                vec![failure]
            }
        };

        for artifact in &artifacts {
            self.artifact_repository.put(artifact).await?;
            self.vector_index
                .upsert(room_id, &artifact.id, &artifact.coordinates)
                .await?;

            match events::card_created(artifact) {
                Ok(event) => {
                    self.room_registry.broadcast(room_id, &event);
                }
                Err(error) => warn!(%error, artifact_id = %artifact.id, "Could not announce artifact"),
            }
        }
        info!("{} artifacts added to the room", artifacts.len());

        let mut timeline = self.artifact_repository.get_all(room_id).await?;
        timeline.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(timeline)
    }

    /// Turns the generated components into artifacts numbered from `start_order`,
    /// keeping the sequence suggested by the model
    async fn place_batch(
        &self,
        room_id: &str,
        start_order: i64,
        mut generated: Vec<GeneratedComponent>,
    ) -> Vec<Artifact> {
        // Stable sort, components without a suggested order stay at the end
        generated.sort_by(|a, b| {
            a.order
                .unwrap_or(f64::INFINITY)
                .total_cmp(&b.order.unwrap_or(f64::INFINITY))
        });

        let mut artifacts = Vec::with_capacity(generated.len());
        for (order, component) in (start_order..).zip(generated) {
            let coordinates = self.coordinates_assigner.assign(&component.component).await;
            artifacts.push(Artifact::new(room_id, order, component, coordinates));
        }
        artifacts
    }
}

#[derive(thiserror::Error)]
pub enum GenerateComponentsError {
    #[error(transparent)]
    ArtifactRepositoryError(#[from] ArtifactRepositoryError),
    #[error(transparent)]
    VectorIndexError(#[from] VectorIndexError),
}

impl std::fmt::Debug for GenerateComponentsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
