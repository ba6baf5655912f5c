use super::ConnectionPool;
use super::Repository;
use crate::shared::config::FeedConfig;
use crate::shared::error::FeedError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

mod candidates;
mod feeds;
mod queries;
mod timeline_cache;

pub struct SqliteRepository {
    pool: ConnectionPool,
    config: FeedConfig,
}

impl SqliteRepository {
    pub fn new(pool: ConnectionPool, config: FeedConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn initialize(&self) -> Result<(), FeedError> {
        self.pool.migrate().await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, FeedError> {
        let result = sqlx::query("SELECT 1")
            .fetch_one(self.pool.get_pool())
            .await;
        Ok(result.is_ok())
    }
}

pub(super) fn datetime_from_millis(millis: i64) -> Result<DateTime<Utc>, FeedError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| FeedError::Database(format!("invalid timestamp: {millis}")))
}
