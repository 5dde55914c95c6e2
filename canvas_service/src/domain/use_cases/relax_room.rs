use std::{collections::HashMap, sync::Arc};

use tracing::{debug, warn};

use crate::{
    configuration::{GravitySettings, SimilaritySettings},
    domain::services::{
        gravity::{moved_ids, relax, GravityParameters, Position},
        similarity::gravity_pairs,
    },
    ports::artifact_repository::{ArtifactField, ArtifactRepository, ArtifactRepositoryError},
    realtime::{events, room_registry::RoomRegistry},
};

/// One step of semantic gravity over the stored layout of a room
pub struct RelaxRoomUseCase {
    artifact_repository: Arc<dyn ArtifactRepository>,
    room_registry: Arc<RoomRegistry>,
    gravity_threshold: f32,
    parameters: GravityParameters,
}

impl RelaxRoomUseCase {
    pub fn new(
        artifact_repository: Arc<dyn ArtifactRepository>,
        room_registry: Arc<RoomRegistry>,
        similarity: &SimilaritySettings,
        gravity: &GravitySettings,
    ) -> Self {
        Self {
            artifact_repository,
            room_registry,
            gravity_threshold: similarity.gravity_threshold,
            parameters: GravityParameters {
                min_separation: gravity.min_separation,
                strength: gravity.strength,
            },
        }
    }

    /// Moves the similar artifacts of the room toward each other, persists the new
    /// positions and broadcasts them to the whole room.
    ///
    /// Returns the number of artifacts moved. A position that cannot be persisted
    /// is not broadcast.
    #[tracing::instrument(name = "Relaxing room layout", skip(self))]
    pub async fn execute(&self, room_id: &str) -> Result<usize, ArtifactRepositoryError> {
        let artifacts = self.artifact_repository.get_all(room_id).await?;

        let positions: HashMap<String, Position> = artifacts
            .iter()
            .filter_map(|artifact| {
                artifact
                    .position()
                    .map(|(x, y)| (artifact.id.clone(), Position { x, y }))
            })
            .collect();
        if positions.len() < 2 {
            return Ok(0);
        }

        let pairs = gravity_pairs(&artifacts, self.gravity_threshold);
        let relaxed = relax(&positions, &pairs, &self.parameters);

        let mut moved = 0;
        for id in moved_ids(&positions, &relaxed) {
            let position = relaxed[id];
            if let Err(error) = self.persist(room_id, id, position).await {
                warn!(?error, artifact_id = id, "Could not persist relaxed position");
                continue;
            }
            self.room_registry
                .broadcast(room_id, &events::card_moved(id, position));
            moved += 1;
        }

        debug!(moved, "Room relaxed");
        Ok(moved)
    }

    async fn persist(
        &self,
        room_id: &str,
        id: &str,
        position: Position,
    ) -> Result<(), ArtifactRepositoryError> {
        self.artifact_repository
            .set_field(room_id, id, ArtifactField::X, position.x.into())
            .await?;
        self.artifact_repository
            .set_field(room_id, id, ArtifactField::Y, position.y.into())
            .await
    }
}
