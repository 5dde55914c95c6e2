use serde::{Deserialize, Serialize};

/// Two artifacts of a room that are semantically close.
///
/// Derived on demand from the current room snapshot, never persisted nor cached.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityPair {
    pub card_a: String,
    pub card_b: String,
    pub score: f32,
}
