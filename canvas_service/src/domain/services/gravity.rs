use std::collections::HashMap;

use crate::domain::entities::similarity_pair::SimilarityPair;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn distance_to(&self, other: &Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityParameters {
    /// Pairs closer than this are left alone
    pub min_separation: f64,
    pub strength: f64,
}

impl Default for GravityParameters {
    fn default() -> Self {
        Self {
            min_separation: 350.0,
            strength: 0.05,
        }
    }
}

/// One corrective step of semantic gravity.
///
/// For every pair whose two artifacts are positioned and further apart than `min_separation`,
/// both artifacts move toward each other along the line joining them, by a combined
/// `(distance - min_separation) * strength * score`, half each.
/// Pairs are applied one after the other on the updated positions.
///
/// There is no repulsion: pairs at or below the minimum separation are untouched,
/// so a settled layout stays as it is.
pub fn relax(
    positions: &HashMap<String, Position>,
    pairs: &[SimilarityPair],
    parameters: &GravityParameters,
) -> HashMap<String, Position> {
    let mut relaxed = positions.clone();

    for pair in pairs {
        if pair.card_a == pair.card_b {
            continue;
        }
        let (Some(a), Some(b)) = (
            relaxed.get(&pair.card_a).copied(),
            relaxed.get(&pair.card_b).copied(),
        ) else {
            continue;
        };

        let distance = a.distance_to(&b);
        if distance <= parameters.min_separation {
            continue;
        }

        let half_displacement = (distance - parameters.min_separation)
            * parameters.strength
            * pair.score as f64
            / 2.0;
        let step_x = (b.x - a.x) / distance * half_displacement;
        let step_y = (b.y - a.y) / distance * half_displacement;

        relaxed.insert(
            pair.card_a.clone(),
            Position {
                x: a.x + step_x,
                y: a.y + step_y,
            },
        );
        relaxed.insert(
            pair.card_b.clone(),
            Position {
                x: b.x - step_x,
                y: b.y - step_y,
            },
        );
    }

    relaxed
}

/// Ids whose position differs between two layouts
pub fn moved_ids<'a>(
    before: &HashMap<String, Position>,
    after: &'a HashMap<String, Position>,
) -> Vec<&'a str> {
    let mut moved: Vec<&str> = after
        .iter()
        .filter(|(id, position)| before.get(*id) != Some(position))
        .map(|(id, _)| id.as_str())
        .collect();
    moved.sort_unstable();
    moved
}
