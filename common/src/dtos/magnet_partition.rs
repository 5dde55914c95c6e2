use serde::{Deserialize, Serialize};

/// Result of a magnet query: the artifact ids of a room split in two disjoint sets.
///
/// Returned by the HTTP magnet endpoint and broadcast as-is on the realtime channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetPartitionDto {
    #[serde(rename = "match")]
    pub matched: Vec<String>,
    pub no_match: Vec<String>,
}
