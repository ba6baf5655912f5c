use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a viewer's materialized timeline. The set of entries sharing
/// a `computed_at` for a viewer forms a generation; generations are swapped
/// whole, never partially updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub viewer_id: String,
    pub post_id: String,
    pub score: f64,
    /// Creation time of the ranked post, kept for deterministic tie-breaks.
    pub post_created_at: DateTime<Utc>,
    pub computed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Observability summary for one viewer's current generation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub entry_count: u64,
    /// Seconds since the oldest entry was computed.
    pub oldest_entry_age_secs: i64,
    /// Seconds since the newest entry was computed.
    pub newest_entry_age_secs: i64,
}
