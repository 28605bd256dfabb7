//! Aggregate snapshot shapes returned by the stats endpoint.
//!
//! The backend pre-aggregates alerts into named bucket groups
//! (terms aggregations). Every group is optional: an empty index
//! yields `{}`.

use serde::{Deserialize, Deserializer, Serialize};

/// One `(category, count)` pair from a pre-aggregated query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregateBucket {
    /// Numeric bucket keys (e.g. priority terms) arrive as JSON
    /// numbers; normalize everything to a string key.
    #[serde(deserialize_with = "key_as_string")]
    pub key: String,
    pub doc_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketGroup {
    pub buckets: Vec<AggregateBucket>,
}

/// Point-in-time aggregate state, fetched once per dashboard mount.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_types: Option<BucketGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_distribution: Option<BucketGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocols: Option<BucketGroup>,
}

fn key_as_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Key {
        Str(String),
        Num(i64),
    }
    Ok(match Key::deserialize(de)? {
        Key::Str(s) => s,
        Key::Num(n) => n.to_string(),
    })
}
