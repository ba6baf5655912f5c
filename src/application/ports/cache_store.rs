use crate::domain::entities::{CacheEntry, CacheStats};
use crate::shared::error::FeedError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Largest page a single read may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A page slice of one viewer's current generation.
#[derive(Debug, Clone)]
pub struct TimelineSlice {
    pub entries: Vec<CacheEntry>,
    pub total_count: u64,
    pub has_more: bool,
}

/// Metadata of the generation a viewer's pointer currently references.
#[derive(Debug, Clone)]
pub struct GenerationMeta {
    pub generation_id: String,
    pub computed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub entry_count: u64,
}

impl GenerationMeta {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Durable per-viewer materialization of ranked timeline entries.
///
/// `replace` swaps in a whole generation atomically: a reader never sees a
/// mix of two generations, and never sees zero entries while a valid prior
/// generation existed (short of legitimate expiry).
#[async_trait]
pub trait TimelineCacheStore: Send + Sync {
    /// Makes `entries` the current generation for `viewer_id`. An empty
    /// generation is recorded too, so readers can tell "empty feed" from
    /// "never refreshed".
    async fn replace(
        &self,
        viewer_id: &str,
        computed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        entries: &[CacheEntry],
    ) -> Result<(), FeedError>;

    /// Reads one page of the current generation, filtered by
    /// `score >= min_score`, ordered by score descending with the
    /// deterministic tie-break. Signals `CacheMiss` when no non-expired
    /// generation exists.
    async fn read(
        &self,
        viewer_id: &str,
        min_score: f64,
        page: u32,
        page_size: u32,
        now: DateTime<Utc>,
    ) -> Result<TimelineSlice, FeedError>;

    /// Deletes expired rows that no viewer's pointer references. Safe to
    /// run concurrently with reads and replaces.
    async fn sweep(&self, now: DateTime<Utc>) -> Result<u64, FeedError>;

    /// Current generation pointer for `viewer_id`, expired or not.
    async fn current_generation(
        &self,
        viewer_id: &str,
    ) -> Result<Option<GenerationMeta>, FeedError>;

    /// Observability summary for the viewer's current generation.
    async fn stats(
        &self,
        viewer_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheStats>, FeedError>;
}

/// Shared input validation for paginated reads.
pub fn validate_paging(page: u32, page_size: u32) -> Result<(), FeedError> {
    if page == 0 {
        return Err(FeedError::InvalidPage("page starts at 1".to_string()));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(FeedError::InvalidPage(format!(
            "page_size must be in 1..={MAX_PAGE_SIZE}, got {page_size}"
        )));
    }
    Ok(())
}

pub fn validate_min_score(min_score: f64) -> Result<(), FeedError> {
    if !min_score.is_finite() || min_score < 0.0 {
        return Err(FeedError::InvalidMinScore(format!(
            "min_score must be finite and non-negative, got {min_score}"
        )));
    }
    Ok(())
}
