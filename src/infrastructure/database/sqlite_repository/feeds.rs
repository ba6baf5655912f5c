use super::datetime_from_millis;
use super::queries::{COUNT_FOLLOWING_POSTS, SELECT_ENGAGED_PUBLIC_POSTS, SELECT_FOLLOWING_PAGE};
use super::SqliteRepository;
use crate::application::ports::{ChronoPage, FeedQueries};
use crate::domain::entities::{EngagementSnapshot, PostCandidate};
use crate::shared::error::FeedError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

#[async_trait]
impl FeedQueries for SqliteRepository {
    async fn following_page(
        &self,
        viewer_id: &str,
        limit: u32,
        offset: u64,
    ) -> Result<ChronoPage, FeedError> {
        let count_row = sqlx::query(COUNT_FOLLOWING_POSTS)
            .bind(viewer_id)
            .fetch_one(self.pool.get_pool())
            .await?;
        let total_count: i64 = count_row.try_get("post_count")?;

        let rows = sqlx::query(SELECT_FOLLOWING_PAGE)
            .bind(viewer_id)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(self.pool.get_pool())
            .await?;

        let mut post_ids = Vec::with_capacity(rows.len());
        for row in rows {
            post_ids.push(row.try_get("id")?);
        }

        Ok(ChronoPage {
            post_ids,
            total_count: total_count.max(0) as u64,
        })
    }

    async fn engaged_public_posts(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<PostCandidate>, FeedError> {
        let scoring = &self.config.scoring;
        let rows = sqlx::query(SELECT_ENGAGED_PUBLIC_POSTS)
            .bind(since.timestamp_millis())
            .bind(scoring.comment_weight as i64)
            .bind(scoring.share_weight as i64)
            .bind(limit as i64)
            .fetch_all(self.pool.get_pool())
            .await?;

        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            let created_at: i64 = row.try_get("created_at")?;
            let reactions: i64 = row.try_get("reaction_count")?;
            let comments: i64 = row.try_get("comment_count")?;
            let shares: i64 = row.try_get("share_count")?;
            posts.push(PostCandidate {
                post_id: row.try_get("id")?,
                author_id: row.try_get("author_id")?,
                created_at: datetime_from_millis(created_at)?,
                is_followed_author: false,
                engagement: EngagementSnapshot::new(
                    reactions.max(0) as u64,
                    comments.max(0) as u64,
                    shares.max(0) as u64,
                ),
            });
        }
        Ok(posts)
    }
}
