use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Engagement counters for a post as of the last platform read.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    pub reactions: u64,
    pub comments: u64,
    pub shares: u64,
}

impl EngagementSnapshot {
    pub fn new(reactions: u64, comments: u64, shares: u64) -> Self {
        Self {
            reactions,
            comments,
            shares,
        }
    }
}

/// A post eligible for ranking in one refresh run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCandidate {
    pub post_id: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub is_followed_author: bool,
    pub engagement: EngagementSnapshot,
}

impl PostCandidate {
    pub fn new(
        post_id: impl Into<String>,
        author_id: impl Into<String>,
        created_at: DateTime<Utc>,
        is_followed_author: bool,
        engagement: EngagementSnapshot,
    ) -> Self {
        Self {
            post_id: post_id.into(),
            author_id: author_id.into(),
            created_at,
            is_followed_author,
            engagement,
        }
    }
}
