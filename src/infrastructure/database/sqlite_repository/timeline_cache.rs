use super::datetime_from_millis;
use super::queries::{
    COUNT_TIMELINE_ENTRIES, INSERT_CACHE_ENTRY, SELECT_GENERATION_POINTER, SELECT_TIMELINE_PAGE,
    SWEEP_EXPIRED_ENTRIES, UPSERT_GENERATION_POINTER,
};
use super::SqliteRepository;
use crate::application::ports::{
    validate_min_score, validate_paging, GenerationMeta, TimelineCacheStore, TimelineSlice,
};
use crate::domain::entities::{CacheEntry, CacheStats};
use crate::shared::error::FeedError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

fn map_pointer_row(row: &SqliteRow) -> Result<GenerationMeta, FeedError> {
    let computed_at: i64 = row.try_get("computed_at")?;
    let expires_at: i64 = row.try_get("expires_at")?;
    let entry_count: i64 = row.try_get("entry_count")?;

    Ok(GenerationMeta {
        generation_id: row.try_get("generation_id")?,
        computed_at: datetime_from_millis(computed_at)?,
        expires_at: datetime_from_millis(expires_at)?,
        entry_count: entry_count.max(0) as u64,
    })
}

#[async_trait]
impl TimelineCacheStore for SqliteRepository {
    async fn replace(
        &self,
        viewer_id: &str,
        computed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        entries: &[CacheEntry],
    ) -> Result<(), FeedError> {
        let generation_id = Uuid::new_v4().to_string();
        let mut tx = self.pool.get_pool().begin().await?;

        for entry in entries {
            sqlx::query(INSERT_CACHE_ENTRY)
                .bind(viewer_id)
                .bind(&generation_id)
                .bind(&entry.post_id)
                .bind(entry.score)
                .bind(entry.post_created_at.timestamp_millis())
                .bind(computed_at.timestamp_millis())
                .bind(expires_at.timestamp_millis())
                .execute(&mut *tx)
                .await?;
        }

        // The pointer swap is the commit point: readers see either the old
        // generation or the new one, never a mix. Old rows stay behind for
        // in-flight readers until a sweep collects them.
        sqlx::query(UPSERT_GENERATION_POINTER)
            .bind(viewer_id)
            .bind(&generation_id)
            .bind(computed_at.timestamp_millis())
            .bind(expires_at.timestamp_millis())
            .bind(entries.len() as i64)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn read(
        &self,
        viewer_id: &str,
        min_score: f64,
        page: u32,
        page_size: u32,
        now: DateTime<Utc>,
    ) -> Result<TimelineSlice, FeedError> {
        validate_paging(page, page_size)?;
        validate_min_score(min_score)?;

        let pointer = self.current_generation(viewer_id).await?;
        let meta = match pointer {
            Some(meta) if !meta.is_expired(now) => meta,
            _ => return Err(FeedError::CacheMiss),
        };

        let count_row = sqlx::query(COUNT_TIMELINE_ENTRIES)
            .bind(viewer_id)
            .bind(&meta.generation_id)
            .bind(min_score)
            .fetch_one(self.pool.get_pool())
            .await?;
        let total_count: i64 = count_row.try_get("entry_count")?;
        let total_count = total_count.max(0) as u64;

        let offset = (page as i64 - 1) * page_size as i64;
        let rows = sqlx::query(SELECT_TIMELINE_PAGE)
            .bind(viewer_id)
            .bind(&meta.generation_id)
            .bind(min_score)
            .bind(page_size as i64)
            .bind(offset)
            .fetch_all(self.pool.get_pool())
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let post_created_at: i64 = row.try_get("post_created_at")?;
            let computed_at: i64 = row.try_get("computed_at")?;
            let expires_at: i64 = row.try_get("expires_at")?;
            entries.push(CacheEntry {
                viewer_id: viewer_id.to_string(),
                post_id: row.try_get("post_id")?,
                score: row.try_get("score")?,
                post_created_at: datetime_from_millis(post_created_at)?,
                computed_at: datetime_from_millis(computed_at)?,
                expires_at: datetime_from_millis(expires_at)?,
            });
        }

        let has_more = (offset as u64 + entries.len() as u64) < total_count;
        Ok(TimelineSlice {
            entries,
            total_count,
            has_more,
        })
    }

    async fn sweep(&self, now: DateTime<Utc>) -> Result<u64, FeedError> {
        let result = sqlx::query(SWEEP_EXPIRED_ENTRIES)
            .bind(now.timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn current_generation(
        &self,
        viewer_id: &str,
    ) -> Result<Option<GenerationMeta>, FeedError> {
        let row = sqlx::query(SELECT_GENERATION_POINTER)
            .bind(viewer_id)
            .fetch_optional(self.pool.get_pool())
            .await?;
        row.as_ref().map(map_pointer_row).transpose()
    }

    async fn stats(
        &self,
        viewer_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheStats>, FeedError> {
        let meta = match self.current_generation(viewer_id).await? {
            Some(meta) => meta,
            None => return Ok(None),
        };

        // All entries of a generation share one computed_at.
        let age_secs = (now - meta.computed_at).num_seconds();
        Ok(Some(CacheStats {
            entry_count: meta.entry_count,
            oldest_entry_age_secs: age_secs,
            newest_entry_age_secs: age_secs,
        }))
    }
}
