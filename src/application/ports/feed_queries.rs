use crate::domain::entities::PostCandidate;
use crate::shared::error::FeedError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A page of chronological post ids plus the total matching count.
#[derive(Debug, Clone)]
pub struct ChronoPage {
    pub post_ids: Vec<String>,
    pub total_count: u64,
}

/// Live (uncached) read paths backing the feed variants.
#[async_trait]
pub trait FeedQueries: Send + Sync {
    /// Published posts by the viewer and their actively-followed authors,
    /// newest first with id as tie-break, offset-paginated.
    async fn following_page(
        &self,
        viewer_id: &str,
        limit: u32,
        offset: u64,
    ) -> Result<ChronoPage, FeedError>;

    /// Published public posts created at or after `since`, ordered by
    /// weighted engagement descending then recency. Serves both the
    /// discover and trending variants; callers compute the display score.
    async fn engaged_public_posts(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<PostCandidate>, FeedError>;
}
