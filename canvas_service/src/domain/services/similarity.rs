use std::collections::{HashMap, HashSet};

use common::dtos::magnet_partition::MagnetPartitionDto;

use crate::{
    domain::entities::{artifact::Artifact, coordinates::Coordinates, similarity_pair::SimilarityPair},
    ports::vector_index::Neighbor,
};

/// Cosine similarity of two vectors: `dot(a, b) / (|a| |b|)`.
///
/// Axes missing from the shorter vector count as 0.
/// Returns 0 when either vector has a zero magnitude. The result is clamped to [0, 1],
/// rounding can otherwise push the similarity of a vector with itself above 1.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (magnitude_a * magnitude_b);
    if similarity.is_nan() {
        0.0
    } else {
        similarity.clamp(0.0, 1.0)
    }
}

/// Cosine distance, in [0, 1]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Similarity of two stored artifacts.
///
/// An incomplete coordinates vector (missing or of the wrong length) scores 0.
pub fn coordinates_similarity(a: &Coordinates, b: &Coordinates) -> f32 {
    if !a.is_complete() || !b.is_complete() {
        return 0.0;
    }
    cosine_similarity(a.as_slice(), b.as_slice())
}

/// Every unordered pair of artifacts whose similarity is strictly above `threshold`.
///
/// Quadratic in the number of artifacts, rooms are expected to stay small.
pub fn gravity_pairs(artifacts: &[Artifact], threshold: f32) -> Vec<SimilarityPair> {
    let mut pairs = vec![];

    for (i, a) in artifacts.iter().enumerate() {
        for b in artifacts.iter().skip(i + 1) {
            let score = coordinates_similarity(&a.coordinates, &b.coordinates);
            if score > threshold {
                pairs.push(SimilarityPair {
                    card_a: a.id.clone(),
                    card_b: b.id.clone(),
                    score,
                });
            }
        }
    }

    pairs
}

/// Splits the artifacts of a room between the ones attracted by the magnet and the others.
///
/// A neighbor matches when its distance is strictly below `distance_threshold`.
/// Every room id ends up in exactly one of the two sets, including the ones
/// the nearest-neighbor search did not return. Neighbors unknown to the room are dropped.
///
/// Matches come closest first, the others keep the room order.
pub fn magnet_partition<'a>(
    room_ids: impl IntoIterator<Item = &'a str>,
    neighbors: &[Neighbor],
    distance_threshold: f32,
) -> MagnetPartitionDto {
    let mut close: HashMap<&str, f32> = HashMap::new();
    for neighbor in neighbors
        .iter()
        .filter(|neighbor| neighbor.distance < distance_threshold)
    {
        close
            .entry(neighbor.id.as_str())
            .and_modify(|distance| *distance = distance.min(neighbor.distance))
            .or_insert(neighbor.distance);
    }

    let mut matched = vec![];
    let mut partition = MagnetPartitionDto::default();
    let mut seen = HashSet::new();

    for id in room_ids {
        if !seen.insert(id) {
            continue;
        }
        match close.get(id) {
            Some(distance) => matched.push((*distance, id)),
            None => partition.no_match.push(id.to_string()),
        }
    }

    matched.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    partition.matched = matched.into_iter().map(|(_, id)| id.to_string()).collect();

    partition
}
