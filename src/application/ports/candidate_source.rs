use crate::domain::entities::PostCandidate;
use crate::shared::error::FeedError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read-only access to the candidate pool: the viewer's own posts, posts
/// from followed authors, and a discovery slice of popular public posts.
/// Implementations fail with `CandidateSourceUnavailable` when the backing
/// read fails; that failure is always retryable.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Returns the pool of posts eligible for ranking for `viewer_id`,
    /// deduplicated by post id. Order is irrelevant; the scorer ranks.
    /// `limit_hint` bounds the pool (and caps the discovery slice at the
    /// configured fraction of it).
    async fn candidates(
        &self,
        viewer_id: &str,
        limit_hint: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<PostCandidate>, FeedError>;
}
