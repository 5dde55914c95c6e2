//! Collaborators standing in for the language model and the document store in unit tests

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::{
    domain::entities::{
        artifact::{Artifact, GeneratedComponent},
        coordinates::Coordinates,
    },
    ports::{
        artifact_repository::{ArtifactField, ArtifactRepository, ArtifactRepositoryError},
        component_generator::{ComponentGenerator, GenerationError},
        embedding_service::{EmbeddingError, EmbeddingService},
    },
    repositories::artifact_in_memory_repository::ArtifactInMemoryRepository,
};

/// Answers every prompt with the same raw batch
pub struct ScriptedGenerator {
    batch: Vec<JsonValue>,
}

impl ScriptedGenerator {
    pub fn new(batch: Vec<JsonValue>) -> Self {
        Self { batch }
    }
}

#[async_trait]
impl ComponentGenerator for ScriptedGenerator {
    async fn generate_components(
        &self,
        _prompt: &str,
        _start_order: i64,
    ) -> Result<Vec<GeneratedComponent>, GenerationError> {
        Ok(GeneratedComponent::parse_batch(self.batch.clone()))
    }
}

pub struct FailingGenerator;

#[async_trait]
impl ComponentGenerator for FailingGenerator {
    async fn generate_components(
        &self,
        _prompt: &str,
        _start_order: i64,
    ) -> Result<Vec<GeneratedComponent>, GenerationError> {
        Err(GenerationError::RequestFailed("model overloaded".into()))
    }
}

/// Embeds every text to the same vector
pub struct FixedEmbeddings {
    coordinates: Coordinates,
}

impl FixedEmbeddings {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            coordinates: Coordinates::from_lossy(values),
        }
    }

    pub fn neutral() -> Self {
        Self {
            coordinates: Coordinates::neutral(),
        }
    }
}

#[async_trait]
impl EmbeddingService for FixedEmbeddings {
    async fn embed(&self, _text: &str) -> Result<Coordinates, EmbeddingError> {
        Ok(self.coordinates.clone())
    }
}

pub struct UnavailableRepository;

#[async_trait]
impl ArtifactRepository for UnavailableRepository {
    async fn put(&self, _artifact: &Artifact) -> Result<(), ArtifactRepositoryError> {
        Err(ArtifactRepositoryError::StorageUnavailable("connection refused".into()))
    }

    async fn get_all(&self, _room_id: &str) -> Result<Vec<Artifact>, ArtifactRepositoryError> {
        Err(ArtifactRepositoryError::StorageUnavailable("connection refused".into()))
    }

    async fn set_field(
        &self,
        _room_id: &str,
        _id: &str,
        _field: ArtifactField,
        _value: JsonValue,
    ) -> Result<(), ArtifactRepositoryError> {
        Err(ArtifactRepositoryError::StorageUnavailable("connection refused".into()))
    }
}

/// In-memory store taking `delay` to apply every field update
pub struct SlowRepository {
    inner: ArtifactInMemoryRepository,
    delay: Duration,
}

impl SlowRepository {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: ArtifactInMemoryRepository::new(),
            delay,
        }
    }

    pub fn inner(&self) -> &ArtifactInMemoryRepository {
        &self.inner
    }
}

#[async_trait]
impl ArtifactRepository for SlowRepository {
    async fn put(&self, artifact: &Artifact) -> Result<(), ArtifactRepositoryError> {
        self.inner.put(artifact).await
    }

    async fn get_all(&self, room_id: &str) -> Result<Vec<Artifact>, ArtifactRepositoryError> {
        self.inner.get_all(room_id).await
    }

    async fn set_field(
        &self,
        room_id: &str,
        id: &str,
        field: ArtifactField,
        value: JsonValue,
    ) -> Result<(), ArtifactRepositoryError> {
        tokio::time::sleep(self.delay).await;
        self.inner.set_field(room_id, id, field, value).await
    }
}
