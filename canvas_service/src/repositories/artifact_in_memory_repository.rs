use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value as JsonValue;

use crate::{
    domain::entities::artifact::Artifact,
    ports::artifact_repository::{
        artifact_key, ArtifactField, ArtifactRepository, ArtifactRepositoryError,
    },
};

/// Artifact documents kept in process memory, keyed by `artifact:<id>`.
///
/// Nothing survives a restart. Room retrieval scans every document:
/// fine for small deployments, it does not scale with the total number of artifacts.
#[derive(Default)]
pub struct ArtifactInMemoryRepository {
    documents: DashMap<String, JsonValue>,
}

impl ArtifactInMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactRepository for ArtifactInMemoryRepository {
    #[tracing::instrument(name = "Saving artifact in memory", skip(self, artifact), fields(artifact_id = %artifact.id))]
    async fn put(&self, artifact: &Artifact) -> Result<(), ArtifactRepositoryError> {
        let key = artifact_key(&artifact.id);
        let document = serde_json::to_value(artifact)
            .map_err(|e| ArtifactRepositoryError::InvalidDocument(key.clone(), e))?;

        self.documents.insert(key, document);
        Ok(())
    }

    #[tracing::instrument(name = "Fetching room artifacts from memory", skip(self))]
    async fn get_all(&self, room_id: &str) -> Result<Vec<Artifact>, ArtifactRepositoryError> {
        // Copies the matching documents first so no shard stays locked while parsing
        let documents: Vec<(String, JsonValue)> = self
            .documents
            .iter()
            .filter(|entry| entry.value().get("roomId").and_then(JsonValue::as_str) == Some(room_id))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        documents
            .into_iter()
            .map(|(key, document)| {
                serde_json::from_value(document)
                    .map_err(|e| ArtifactRepositoryError::InvalidDocument(key, e))
            })
            .collect()
    }

    #[tracing::instrument(name = "Updating artifact field in memory", skip(self))]
    async fn set_field(
        &self,
        room_id: &str,
        id: &str,
        field: ArtifactField,
        value: JsonValue,
    ) -> Result<(), ArtifactRepositoryError> {
        let not_found = || ArtifactRepositoryError::ArtifactNotFound(id.to_string());

        let mut document = self.documents.get_mut(&artifact_key(id)).ok_or_else(not_found)?;
        if document.value().get("roomId").and_then(JsonValue::as_str) != Some(room_id) {
            return Err(not_found());
        }

        let fields = document.value_mut().as_object_mut().ok_or_else(not_found)?;
        fields.insert(field.as_str().to_string(), value);
        Ok(())
    }
}
