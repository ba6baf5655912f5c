use super::queries::{SELECT_DISCOVERY_CANDIDATES, SELECT_PERSONAL_CANDIDATES};
use super::SqliteRepository;
use crate::application::ports::CandidateSource;
use crate::domain::entities::{EngagementSnapshot, PostCandidate};
use crate::shared::error::FeedError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashMap;

fn map_candidate_row(row: &SqliteRow, is_followed: bool) -> Result<PostCandidate, FeedError> {
    let created_at_millis: i64 = row.try_get("created_at").map_err(source_unavailable)?;
    let reactions: i64 = row.try_get("reaction_count").map_err(source_unavailable)?;
    let comments: i64 = row.try_get("comment_count").map_err(source_unavailable)?;
    let shares: i64 = row.try_get("share_count").map_err(source_unavailable)?;

    Ok(PostCandidate {
        post_id: row.try_get("id").map_err(source_unavailable)?,
        author_id: row.try_get("author_id").map_err(source_unavailable)?,
        created_at: candidate_timestamp(created_at_millis)?,
        is_followed_author: is_followed,
        engagement: EngagementSnapshot::new(
            reactions.max(0) as u64,
            comments.max(0) as u64,
            shares.max(0) as u64,
        ),
    })
}

fn source_unavailable(err: sqlx::Error) -> FeedError {
    FeedError::CandidateSourceUnavailable(err.to_string())
}

// Every failure on this path is the candidate source's, timestamps included.
fn candidate_timestamp(millis: i64) -> Result<DateTime<Utc>, FeedError> {
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
        FeedError::CandidateSourceUnavailable(format!("invalid timestamp: {millis}"))
    })
}

#[async_trait]
impl CandidateSource for SqliteRepository {
    async fn candidates(
        &self,
        viewer_id: &str,
        limit_hint: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<PostCandidate>, FeedError> {
        if limit_hint == 0 {
            return Ok(Vec::new());
        }

        let cache = &self.config.cache;
        let scoring = &self.config.scoring;
        let lookback_start = now - Duration::days(cache.lookback_days as i64);
        let discovery_start = now - Duration::hours(cache.discovery_window_hours as i64);
        let discovery_cap = (limit_hint as f64 * cache.discovery_fraction_max).floor() as i64;

        let personal_rows = sqlx::query(SELECT_PERSONAL_CANDIDATES)
            .bind(viewer_id)
            .bind(lookback_start.timestamp_millis())
            .bind(limit_hint as i64)
            .fetch_all(self.pool.get_pool())
            .await
            .map_err(source_unavailable)?;

        let mut pool: HashMap<String, PostCandidate> =
            HashMap::with_capacity(personal_rows.len());
        for row in personal_rows {
            let is_followed: i64 = row.try_get("is_followed").map_err(source_unavailable)?;
            let candidate = map_candidate_row(&row, is_followed != 0)?;
            pool.insert(candidate.post_id.clone(), candidate);
        }

        if discovery_cap > 0 {
            let discovery_rows = sqlx::query(SELECT_DISCOVERY_CANDIDATES)
                .bind(viewer_id)
                .bind(discovery_start.timestamp_millis())
                .bind(scoring.comment_weight as i64)
                .bind(scoring.share_weight as i64)
                .bind(discovery_cap)
                .fetch_all(self.pool.get_pool())
                .await
                .map_err(source_unavailable)?;

            for row in discovery_rows {
                let candidate = map_candidate_row(&row, false)?;
                // Personal candidates win on overlap.
                pool.entry(candidate.post_id.clone()).or_insert(candidate);
            }
        }

        Ok(pool.into_values().collect())
    }
}
