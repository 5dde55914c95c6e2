use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::{
    prelude::QdrantClient,
    qdrant::{
        self, value::Kind, vectors_config::Config, Condition, CreateCollection, Distance,
        FieldType, Filter, PointStruct, SearchPoints, VectorParams, VectorsConfig,
    },
};
use tracing::info;
use uuid::Uuid;

use crate::{
    domain::entities::coordinates::{Coordinates, DIMENSIONS},
    ports::vector_index::{versioned_index_name, Neighbor, VectorIndex, VectorIndexError},
};

/// Artifact coordinates indexed in a Qdrant collection.
///
/// Each point carries the artifact `id` and `roomId` as keyword payloads,
/// searches are filtered on `roomId`.
pub struct ArtifactPointQdrantRepository {
    client: QdrantClient,
    collection_name: String,
}

impl ArtifactPointQdrantRepository {
    pub fn new(client: QdrantClient, collection_prefix: &str) -> Self {
        Self {
            client,
            collection_name: versioned_index_name(collection_prefix),
        }
    }

    /// Creating an index that already exists is a no-op in Qdrant,
    /// so collections created before an index was added get it too
    async fn create_field_indexes(&self) -> Result<(), VectorIndexError> {
        for field in INDEXED_FIELDS {
            self.client
                .create_field_index(
                    &self.collection_name,
                    field,
                    FieldType::Keyword,
                    None,
                    None,
                )
                .await
                .map_err(|e| VectorIndexError::IndexUnavailable(e.to_string()))?;
        }
        Ok(())
    }

    async fn create_collection(&self) -> Result<(), VectorIndexError> {
        match self
            .client
            .create_collection(&CreateCollection {
                collection_name: self.collection_name.clone(),
                vectors_config: Some(VectorsConfig {
                    config: Some(Config::Params(VectorParams {
                        size: DIMENSIONS as u64,
                        distance: Distance::Cosine as i32,
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await
        {
            Ok(_) => info!("Qdrant collection created"),
            // Another instance created it in the meantime
            Err(error) if error.to_string().contains("already exists") => {
                info!("Qdrant collection already exists");
            }
            Err(error) => return Err(VectorIndexError::IndexUnavailable(error.to_string())),
        };
        Ok(())
    }

    async fn collection_exists(&self) -> Result<bool, VectorIndexError> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| VectorIndexError::IndexUnavailable(e.to_string()))?;

        Ok(response
            .collections
            .iter()
            .any(|collection| collection.name == self.collection_name))
    }
}

/// Keyword payloads of each point, all of them indexed
const INDEXED_FIELDS: [&str; 2] = ["roomId", "id"];

fn point_payload(room_id: &str, id: &str) -> HashMap<String, qdrant::Value> {
    HashMap::from([
        (INDEXED_FIELDS[0].into(), qdrant::Value::from(room_id.to_string())),
        (INDEXED_FIELDS[1].into(), qdrant::Value::from(id.to_string())),
    ])
}

/// Qdrant only accepts integers or UUIDs as point ids
fn point_id(artifact_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, artifact_id.as_bytes()).to_string()
}

#[async_trait]
impl VectorIndex for ArtifactPointQdrantRepository {
    #[tracing::instrument(name = "Building Qdrant artifacts collection", skip(self), fields(collection = %self.collection_name))]
    async fn build(&self) -> Result<(), VectorIndexError> {
        if self.collection_exists().await? {
            info!("Qdrant collection already exists");
        } else {
            self.create_collection().await?;
        }

        self.create_field_indexes().await
    }

    #[tracing::instrument(name = "Saving artifact point to Qdrant", skip(self, coordinates))]
    async fn upsert(
        &self,
        room_id: &str,
        id: &str,
        coordinates: &Coordinates,
    ) -> Result<(), VectorIndexError> {
        let payload = point_payload(room_id, id);
        let vector: Vec<f32> = coordinates.as_slice().to_vec();

        self.client
            .upsert_points(
                &self.collection_name,
                vec![PointStruct {
                    id: Some(point_id(id).into()),
                    vectors: Some(vector.into()),
                    payload,
                }],
                None,
            )
            .await
            .map_err(|e| VectorIndexError::IndexUnavailable(e.to_string()))?;

        Ok(())
    }

    #[tracing::instrument(name = "Searching Qdrant artifacts collection", skip(self, query))]
    async fn knn(
        &self,
        query: &Coordinates,
        room_id: &str,
        k: usize,
    ) -> Result<Vec<Neighbor>, VectorIndexError> {
        if k == 0 {
            return Ok(vec![]);
        }

        let response = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.collection_name.clone(),
                vector: query.as_slice().to_vec(),
                filter: Some(Filter::must([Condition::matches(
                    "roomId",
                    room_id.to_string(),
                )])),
                limit: k as u64,
                with_payload: Some(true.into()),
                ..Default::default()
            })
            .await
            .map_err(|e| VectorIndexError::IndexUnavailable(e.to_string()))?;

        // Qdrant scores cosine as a similarity, sorted by descending score
        response
            .result
            .into_iter()
            .map(|point| match point.payload.get("id").and_then(|value| value.kind.as_ref()) {
                Some(Kind::StringValue(id)) => Ok(Neighbor {
                    id: id.clone(),
                    distance: 1.0 - point.score,
                }),
                _ => Err(VectorIndexError::InvalidResponse(format!(
                    "point {:?} has no artifact id",
                    point.id
                ))),
            })
            .collect()
    }
}
