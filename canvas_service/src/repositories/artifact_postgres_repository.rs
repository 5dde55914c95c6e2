use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{types::Json, PgPool, Row};

use crate::{
    domain::entities::artifact::Artifact,
    ports::artifact_repository::{
        artifact_key, ArtifactField, ArtifactRepository, ArtifactRepositoryError,
    },
};

/// Artifact documents persisted in Postgres, one JSONB row per artifact keyed by `artifact:<id>`.
///
/// The room id is duplicated in an indexed column so a room is fetched
/// without scanning every document.
pub struct ArtifactPostgresRepository {
    db_pool: PgPool,
}

impl ArtifactPostgresRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Creates the `artifacts` table if the migrations did not run yet
    #[tracing::instrument(name = "Running artifacts migrations", skip(self))]
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.db_pool).await
    }
}

#[async_trait]
impl ArtifactRepository for ArtifactPostgresRepository {
    #[tracing::instrument(name = "Saving artifact in database", skip(self, artifact), fields(artifact_id = %artifact.id))]
    async fn put(&self, artifact: &Artifact) -> Result<(), ArtifactRepositoryError> {
        sqlx::query(
            r#"
    INSERT INTO artifacts (key, room_id, document)
    VALUES ($1, $2, $3)
    ON CONFLICT (key) DO UPDATE SET room_id = EXCLUDED.room_id, document = EXCLUDED.document
            "#,
        )
        .bind(artifact_key(&artifact.id))
        .bind(&artifact.room_id)
        .bind(Json(artifact))
        .execute(&self.db_pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    #[tracing::instrument(name = "Fetching room artifacts from database", skip(self))]
    async fn get_all(&self, room_id: &str) -> Result<Vec<Artifact>, ArtifactRepositoryError> {
        let rows = sqlx::query(
            r#"
    SELECT key, document FROM artifacts
    WHERE room_id = $1
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter()
            .map(|row| {
                let key: String = row.try_get("key").map_err(storage_error)?;
                let document: JsonValue = row.try_get("document").map_err(storage_error)?;
                serde_json::from_value(document)
                    .map_err(|e| ArtifactRepositoryError::InvalidDocument(key, e))
            })
            .collect()
    }

    #[tracing::instrument(name = "Updating artifact field in database", skip(self))]
    async fn set_field(
        &self,
        room_id: &str,
        id: &str,
        field: ArtifactField,
        value: JsonValue,
    ) -> Result<(), ArtifactRepositoryError> {
        let result = sqlx::query(
            r#"
    UPDATE artifacts SET document = jsonb_set(document, ARRAY[$3::text], $4, true)
    WHERE key = $1 AND room_id = $2
            "#,
        )
        .bind(artifact_key(id))
        .bind(room_id)
        .bind(field.as_str())
        .bind(Json(value))
        .execute(&self.db_pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(ArtifactRepositoryError::ArtifactNotFound(id.to_string()));
        }
        Ok(())
    }
}

fn storage_error(error: sqlx::Error) -> ArtifactRepositoryError {
    ArtifactRepositoryError::StorageUnavailable(error.to_string())
}
