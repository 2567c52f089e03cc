//! Bulk storage port (driven/secondary port)
//!
//! A bulk segment is one batch of fetched documents written as a unit. Keys
//! are `/`-separated relative paths such as
//! `rank_match_info/GOLD_II_match_infos/<puuid>/match_info_bulk_0.json`.

use serde_json::Value;

/// File name stem of match document segments (`match_info_bulk_<page>.json`)
pub const MATCH_SEGMENT_STEM: &str = "match_info_bulk_";

/// File name stem of timeline segments
pub const TIMELINE_SEGMENT_STEM: &str = "timeline_bulk_";

/// Whether `key` names a segment of match documents.
pub fn is_match_segment(key: &str) -> bool {
    key.rsplit('/')
        .next()
        .is_some_and(|name| name.starts_with(MATCH_SEGMENT_STEM) && name.ends_with(".json"))
}

/// Page number of a match segment (`.../match_info_bulk_<page>.json`).
pub fn segment_page(key: &str) -> Option<u32> {
    key.rsplit('/')
        .next()?
        .strip_prefix(MATCH_SEGMENT_STEM)?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

/// Port trait for segment storage
///
/// Writes must be atomic per segment: a reader either sees the complete
/// document list or no segment at all.
#[async_trait::async_trait]
pub trait IBulkStorage: Send + Sync {
    /// Writes `docs` under `key`, replacing any previous segment, and
    /// returns a URI locating the stored segment.
    async fn put_segment(&self, key: &str, docs: &[Value]) -> anyhow::Result<String>;

    /// Reads back a previously written segment.
    async fn get_segment(&self, key: &str) -> anyhow::Result<Vec<Value>>;

    /// Lists segment keys below `prefix`, sorted.
    async fn list_segments(&self, prefix: &str) -> anyhow::Result<Vec<String>>;
}
