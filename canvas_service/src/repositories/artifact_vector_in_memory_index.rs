use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use crate::{
    domain::{entities::coordinates::Coordinates, services::similarity::cosine_distance},
    ports::vector_index::{versioned_index_name, Neighbor, VectorIndex, VectorIndexError},
};

struct IndexedPoint {
    room_id: String,
    coordinates: Coordinates,
}

/// Flat (brute-force) cosine index kept in process memory
pub struct ArtifactVectorInMemoryIndex {
    name: String,
    built: AtomicBool,
    points: DashMap<String, IndexedPoint>,
}

impl ArtifactVectorInMemoryIndex {
    pub fn new(prefix: &str) -> Self {
        Self {
            name: versioned_index_name(prefix),
            built: AtomicBool::new(false),
            points: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl VectorIndex for ArtifactVectorInMemoryIndex {
    #[tracing::instrument(name = "Building in-memory vector index", skip(self), fields(index = %self.name))]
    async fn build(&self) -> Result<(), VectorIndexError> {
        if self.built.swap(true, Ordering::SeqCst) {
            info!("Vector index already exists");
        } else {
            info!("Vector index created");
        }
        Ok(())
    }

    async fn upsert(
        &self,
        room_id: &str,
        id: &str,
        coordinates: &Coordinates,
    ) -> Result<(), VectorIndexError> {
        self.points.insert(
            id.to_string(),
            IndexedPoint {
                room_id: room_id.to_string(),
                coordinates: coordinates.clone(),
            },
        );
        Ok(())
    }

    #[tracing::instrument(name = "Searching in-memory vector index", skip(self, query))]
    async fn knn(
        &self,
        query: &Coordinates,
        room_id: &str,
        k: usize,
    ) -> Result<Vec<Neighbor>, VectorIndexError> {
        if !self.built.load(Ordering::SeqCst) {
            return Err(VectorIndexError::IndexUnavailable(format!(
                "index {} has not been built",
                self.name
            )));
        }

        let mut neighbors: Vec<Neighbor> = self
            .points
            .iter()
            .filter(|entry| entry.value().room_id == room_id)
            .map(|entry| {
                let point = entry.value();
                let distance = if point.coordinates.is_complete() {
                    cosine_distance(query.as_slice(), point.coordinates.as_slice())
                } else {
                    1.0
                };
                Neighbor {
                    id: entry.key().clone(),
                    distance,
                }
            })
            .collect();

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);

        Ok(neighbors)
    }
}
