use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of axes of the semantic space.
///
/// Shared by the embedding collaborator, the vector index schema and the similarity engine.
/// Changing it requires bumping `INDEX_SCHEMA_VERSION`.
pub const DIMENSIONS: usize = 10;

/// Version of the vector index schema, part of the index name
pub const INDEX_SCHEMA_VERSION: u32 = 2;

/// Value of every axis of the neutral vector, used when embedding fails
pub const NEUTRAL_VALUE: f32 = 0.5;

/// Position of an artifact in the semantic space.
///
/// Replaced as a whole, never mutated axis by axis.
/// Vectors read back from storage are kept as they are, even with a wrong length:
/// similarity treats missing axes as 0.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Coordinates(Vec<f32>);

impl Coordinates {
    /// Independent uniform draws in [0, 1]
    pub fn random(rng: &mut impl Rng) -> Self {
        Self((0..DIMENSIONS).map(|_| rng.gen_range(0.0..=1.0)).collect())
    }

    /// Random coordinates drawn from the thread-local generator
    pub fn placeholder() -> Self {
        Self::random(&mut rand::thread_rng())
    }

    pub fn neutral() -> Self {
        Self(vec![NEUTRAL_VALUE; DIMENSIONS])
    }

    /// Builds coordinates from an untrusted vector (an embedding output, a query).
    ///
    /// Missing axes are filled with 0, extra axes are dropped,
    /// values are clamped to [0, 1] and NaN becomes 0.
    pub fn from_lossy(mut values: Vec<f32>) -> Self {
        values.resize(DIMENSIONS, 0.0);
        for value in values.iter_mut() {
            *value = if value.is_nan() {
                0.0
            } else {
                value.clamp(0.0, 1.0)
            };
        }
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn is_complete(&self) -> bool {
        self.0.len() == DIMENSIONS
    }
}

impl AsRef<[f32]> for Coordinates {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl From<Coordinates> for Vec<f32> {
    fn from(coordinates: Coordinates) -> Self {
        coordinates.0
    }
}
