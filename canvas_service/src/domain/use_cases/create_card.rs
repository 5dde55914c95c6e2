use std::sync::Arc;

use common::helper::error_chain_fmt;
use tracing::{info, warn};

use crate::{
    domain::{
        entities::{
            artifact::{Artifact, Component},
            coordinates::Coordinates,
        },
        services::{coordinates_assigner::CoordinatesAssigner, room_sequencer::RoomSequencer},
    },
    ports::{
        artifact_repository::{ArtifactRepository, ArtifactRepositoryError},
        vector_index::{VectorIndex, VectorIndexError},
    },
    realtime::{events, room_registry::RoomRegistry},
};

pub struct CreateCardRequest {
    pub text: String,
    pub room_id: String,
    pub user_id: String,
}

/// Adds a text card typed by a user at the end of the room timeline
pub struct CreateCardUseCase {
    artifact_repository: Arc<dyn ArtifactRepository>,
    vector_index: Arc<dyn VectorIndex>,
    coordinates_assigner: Arc<CoordinatesAssigner>,
    room_sequencer: Arc<RoomSequencer>,
    room_registry: Arc<RoomRegistry>,
}

impl CreateCardUseCase {
    pub fn new(
        artifact_repository: Arc<dyn ArtifactRepository>,
        vector_index: Arc<dyn VectorIndex>,
        coordinates_assigner: Arc<CoordinatesAssigner>,
        room_sequencer: Arc<RoomSequencer>,
        room_registry: Arc<RoomRegistry>,
    ) -> Self {
        Self {
            artifact_repository,
            vector_index,
            coordinates_assigner,
            room_sequencer,
            room_registry,
        }
    }

    #[tracing::instrument(name = "Creating card use case", skip(self, request), fields(room_id = %request.room_id, user_id = %request.user_id))]
    pub async fn execute(&self, request: &CreateCardRequest) -> Result<Artifact, CreateCardError> {
        let room_id = request.room_id.as_str();
        let _room_guard = self.room_sequencer.lock(room_id).await;

        let existing = self.artifact_repository.get_all(room_id).await?;
        let order = Artifact::next_order(&existing);

        let coordinates: Coordinates = self
            .coordinates_assigner
            .assign(&Component::text(&request.text))
            .await;
        let card = Artifact::new_text(room_id, order, &request.text, coordinates);

        self.artifact_repository.put(&card).await?;
        self.vector_index
            .upsert(room_id, &card.id, &card.coordinates)
            .await?;
        info!(card_id = %card.id, order, "Card created");

        match events::card_created(&card) {
            Ok(event) => {
                self.room_registry.broadcast(room_id, &event);
            }
            Err(error) => warn!(%error, "Could not announce card"),
        }

        Ok(card)
    }
}

#[derive(thiserror::Error)]
pub enum CreateCardError {
    #[error(transparent)]
    ArtifactRepositoryError(#[from] ArtifactRepositoryError),
    #[error(transparent)]
    VectorIndexError(#[from] VectorIndexError),
}

impl std::fmt::Debug for CreateCardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
