use async_trait::async_trait;
use common::helper::error_chain_fmt;
use serde_json::Value as JsonValue;

use crate::domain::entities::artifact::Artifact;

/// Prefix of the key of every artifact document
pub const ARTIFACT_KEY_PREFIX: &str = "artifact:";

/// Storage key of an artifact document
pub fn artifact_key(id: &str) -> String {
    format!("{}{}", ARTIFACT_KEY_PREFIX, id)
}

/// Top-level fields of a stored artifact that can be mutated in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactField {
    X,
    Y,
}

impl ArtifactField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactField::X => "x",
            ArtifactField::Y => "y",
        }
    }
}

/// Document store of the artifacts of every room.
///
/// Writes are last-writer-wins, there is no transaction across calls:
/// a batch written one artifact at a time keeps its committed prefix on failure.
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// Upserts the whole document, no merge with a previous version
    async fn put(&self, artifact: &Artifact) -> Result<(), ArtifactRepositoryError>;

    /// Every artifact of the room, in no particular order
    async fn get_all(&self, room_id: &str) -> Result<Vec<Artifact>, ArtifactRepositoryError>;

    /// Replaces a single field of a stored artifact, leaving the rest of the document untouched.
    ///
    /// The artifact must belong to `room_id`, an artifact of another room is reported as not found.
    async fn set_field(
        &self,
        room_id: &str,
        id: &str,
        field: ArtifactField,
        value: JsonValue,
    ) -> Result<(), ArtifactRepositoryError>;
}

#[derive(thiserror::Error)]
pub enum ArtifactRepositoryError {
    #[error("Document store unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Artifact {0} does not exist")]
    ArtifactNotFound(String),

    #[error("Stored document {0} is not a valid artifact: {1}")]
    InvalidDocument(String, #[source] serde_json::Error),
}

impl std::fmt::Debug for ArtifactRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
