use crate::application::ports::{
    validate_min_score, validate_paging, FeedQueries, TimelineCacheStore, TimelineSlice,
};
use crate::application::services::RefreshService;
use crate::domain::entities::{FollowingPage, Pagination, RankedPostRef, TimelinePage, TrendingTimeframe};
use crate::domain::scoring;
use crate::shared::config::{CacheConfig, ScoringConfig};
use crate::shared::error::FeedError;
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Read-side entry point: serves the cached personalized timeline plus the
/// live (uncached) feed variants.
pub struct TimelineService {
    cache_store: Arc<dyn TimelineCacheStore>,
    refresh: Arc<RefreshService>,
    feed_queries: Arc<dyn FeedQueries>,
    cache_config: CacheConfig,
    scoring_config: ScoringConfig,
}

impl TimelineService {
    pub fn new(
        cache_store: Arc<dyn TimelineCacheStore>,
        refresh: Arc<RefreshService>,
        feed_queries: Arc<dyn FeedQueries>,
        cache_config: CacheConfig,
        scoring_config: ScoringConfig,
    ) -> Self {
        Self {
            cache_store,
            refresh,
            feed_queries,
            cache_config,
            scoring_config,
        }
    }

    /// One page of the viewer's ranked timeline. A cache miss triggers a
    /// single refresh followed by exactly one re-read; a still-empty cache
    /// after a successful refresh is served as an empty page.
    pub async fn get_timeline(
        &self,
        viewer_id: &str,
        page: u32,
        page_size: u32,
        min_score: f64,
    ) -> Result<TimelinePage, FeedError> {
        validate_paging(page, page_size)?;
        validate_min_score(min_score)?;

        match self
            .cache_store
            .read(viewer_id, min_score, page, page_size, Utc::now())
            .await
        {
            Ok(slice) => Ok(to_timeline_page(slice, page, page_size)),
            Err(FeedError::CacheMiss) => {
                tracing::debug!(viewer_id, "cache miss, refreshing timeline");
                let refreshed = self.refresh.refresh(viewer_id).await;

                match self
                    .cache_store
                    .read(viewer_id, min_score, page, page_size, Utc::now())
                    .await
                {
                    Ok(slice) => Ok(to_timeline_page(slice, page, page_size)),
                    Err(FeedError::CacheMiss) => match refreshed {
                        Ok(_) => Ok(TimelinePage::empty(page, page_size)),
                        Err(err) => Err(err),
                    },
                    Err(err) => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Strictly chronological feed of the viewer's own and followed
    /// authors' posts. Always a live query; an empty result is an empty
    /// page, never an error.
    pub async fn get_following_feed(
        &self,
        viewer_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<FollowingPage, FeedError> {
        validate_paging(page, page_size)?;

        let offset = (page as u64 - 1) * page_size as u64;
        let chrono_page = self
            .feed_queries
            .following_page(viewer_id, page_size, offset)
            .await?;

        let has_more = (offset + chrono_page.post_ids.len() as u64) < chrono_page.total_count;
        Ok(FollowingPage {
            posts: chrono_page.post_ids,
            pagination: Pagination {
                page,
                page_size,
                total_count: chrono_page.total_count,
                has_more,
            },
        })
    }

    /// Viewer-independent discovery list: recent public posts ranked by
    /// log-damped engagement. Never persisted.
    pub async fn get_discover_feed(&self, limit: u32) -> Result<Vec<RankedPostRef>, FeedError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let since = Utc::now() - Duration::hours(self.cache_config.discovery_window_hours as i64);
        let posts = self.feed_queries.engaged_public_posts(since, limit).await?;

        let mut ranked: Vec<RankedPostRef> = posts
            .iter()
            .map(|p| RankedPostRef {
                post_id: p.post_id.clone(),
                score: scoring::base_engagement(&p.engagement, &self.scoring_config),
            })
            .collect();
        sort_refs(&mut ranked, &posts);
        ranked.truncate(limit as usize);
        Ok(ranked)
    }

    /// Viewer-independent trending list: engagement velocity (weighted
    /// engagement per hour of the timeframe) over posts created within it.
    pub async fn get_trending_feed(
        &self,
        timeframe: TrendingTimeframe,
        limit: u32,
    ) -> Result<Vec<RankedPostRef>, FeedError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let hours = timeframe.hours();
        let since = Utc::now() - Duration::hours(hours);
        let posts = self.feed_queries.engaged_public_posts(since, limit).await?;

        let mut ranked: Vec<RankedPostRef> = posts
            .iter()
            .map(|p| RankedPostRef {
                post_id: p.post_id.clone(),
                score: scoring::weighted_engagement(&p.engagement, &self.scoring_config) as f64
                    / hours as f64,
            })
            .collect();
        sort_refs(&mut ranked, &posts);
        ranked.truncate(limit as usize);
        Ok(ranked)
    }
}

fn to_timeline_page(slice: TimelineSlice, page: u32, page_size: u32) -> TimelinePage {
    TimelinePage {
        posts: slice
            .entries
            .into_iter()
            .map(|e| RankedPostRef {
                post_id: e.post_id,
                score: e.score,
            })
            .collect(),
        pagination: Pagination {
            page,
            page_size,
            total_count: slice.total_count,
            has_more: slice.has_more,
        },
    }
}

/// Reorders `ranked` by score with the usual created_at / post_id
/// tie-break; `posts` and `ranked` are index-aligned on input.
fn sort_refs(ranked: &mut [RankedPostRef], posts: &[crate::domain::entities::PostCandidate]) {
    use std::collections::HashMap;
    let created: HashMap<&str, chrono::DateTime<Utc>> = posts
        .iter()
        .map(|p| (p.post_id.as_str(), p.created_at))
        .collect();
    ranked.sort_by(|a, b| {
        let a_created = created.get(a.post_id.as_str()).copied().unwrap_or_default();
        let b_created = created.get(b.post_id.as_str()).copied().unwrap_or_default();
        scoring::compare_ranked(
            (a.score, a_created, a.post_id.as_str()),
            (b.score, b_created, b.post_id.as_str()),
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::CandidateSource;
    use crate::infrastructure::database::{ConnectionPool, SqliteRepository};
    use crate::shared::config::FeedConfig;
    use chrono::{DateTime, Utc};

    struct Harness {
        repo: Arc<SqliteRepository>,
        service: TimelineService,
    }

    async fn setup(name: &str) -> Harness {
        let pool = ConnectionPool::in_memory(name).await.unwrap();
        pool.migrate().await.unwrap();
        let config = FeedConfig::default();
        let repo = Arc::new(SqliteRepository::new(pool, config.clone()));

        let refresh = Arc::new(RefreshService::new(
            repo.clone() as Arc<dyn CandidateSource>,
            repo.clone() as Arc<dyn TimelineCacheStore>,
            config.cache.clone(),
            config.scoring,
        ));
        let service = TimelineService::new(
            repo.clone() as Arc<dyn TimelineCacheStore>,
            refresh,
            repo.clone() as Arc<dyn FeedQueries>,
            config.cache.clone(),
            config.scoring,
        );
        Harness { repo, service }
    }

    async fn insert_post(
        repo: &SqliteRepository,
        id: &str,
        author: &str,
        created_at: DateTime<Utc>,
        privacy: &str,
        engagement: (i64, i64, i64),
    ) {
        sqlx::query(
            "INSERT INTO posts (id, author_id, created_at, published, privacy, \
             reaction_count, comment_count, share_count) \
             VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6, ?7)",
        )
        .bind(id)
        .bind(author)
        .bind(created_at.timestamp_millis())
        .bind(privacy)
        .bind(engagement.0)
        .bind(engagement.1)
        .bind(engagement.2)
        .execute(repo.pool().get_pool())
        .await
        .unwrap();
    }

    async fn insert_follow(repo: &SqliteRepository, follower: &str, followee: &str) {
        sqlx::query("INSERT INTO follows (follower_id, followee_id, active) VALUES (?1, ?2, 1)")
            .bind(follower)
            .bind(followee)
            .execute(repo.pool().get_pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn first_read_populates_the_cache() {
        let h = setup("svc_first_read").await;
        let now = Utc::now();
        insert_follow(&h.repo, "viewer", "friend").await;
        insert_post(&h.repo, "p1", "friend", now - chrono::Duration::hours(1), "public", (5, 1, 0)).await;
        insert_post(&h.repo, "p2", "viewer", now - chrono::Duration::hours(2), "public", (0, 0, 0)).await;

        let page = h.service.get_timeline("viewer", 1, 20, 0.0).await.unwrap();
        assert_eq!(page.pagination.total_count, 2);
        assert_eq!(page.posts[0].post_id, "p1");

        let meta = h.repo.current_generation("viewer").await.unwrap();
        assert!(meta.is_some(), "read-through should have materialized a generation");
    }

    #[tokio::test]
    async fn second_read_serves_the_same_generation() {
        let h = setup("svc_second_read").await;
        let now = Utc::now();
        insert_post(&h.repo, "p1", "viewer", now, "public", (3, 0, 0)).await;

        h.service.get_timeline("viewer", 1, 20, 0.0).await.unwrap();
        let first_gen = h.repo.current_generation("viewer").await.unwrap().unwrap();

        h.service.get_timeline("viewer", 1, 20, 0.0).await.unwrap();
        let second_gen = h.repo.current_generation("viewer").await.unwrap().unwrap();
        assert_eq!(first_gen.generation_id, second_gen.generation_id);
    }

    #[tokio::test]
    async fn viewer_with_no_posts_gets_an_empty_page() {
        let h = setup("svc_empty").await;

        let page = h.service.get_timeline("loner", 1, 20, 0.0).await.unwrap();
        assert!(page.posts.is_empty());
        assert_eq!(page.pagination.total_count, 0);
        assert!(!page.pagination.has_more);
    }

    #[tokio::test]
    async fn min_score_returns_strict_subset() {
        let h = setup("svc_min_score").await;
        let now = Utc::now();
        insert_follow(&h.repo, "viewer", "friend").await;
        insert_post(&h.repo, "p_hot", "friend", now, "public", (50, 10, 5)).await;
        insert_post(&h.repo, "p_cold", "friend", now - chrono::Duration::days(10), "public", (0, 0, 0)).await;

        let all = h.service.get_timeline("viewer", 1, 20, 0.0).await.unwrap();
        assert_eq!(all.pagination.total_count, 2);

        let cutoff = all.posts[0].score;
        let subset = h.service.get_timeline("viewer", 1, 20, cutoff).await.unwrap();
        assert_eq!(subset.pagination.total_count, 1);
        assert_eq!(subset.posts[0].post_id, "p_hot");
    }

    #[tokio::test]
    async fn invalid_input_passes_through_without_refreshing() {
        let h = setup("svc_invalid").await;

        assert!(matches!(
            h.service.get_timeline("viewer", 0, 20, 0.0).await,
            Err(FeedError::InvalidPage(_))
        ));
        assert!(matches!(
            h.service.get_timeline("viewer", 1, 20, -1.0).await,
            Err(FeedError::InvalidMinScore(_))
        ));
        assert!(h.repo.current_generation("viewer").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn following_feed_is_chronological_and_excludes_strangers() {
        let h = setup("svc_following").await;
        let now = Utc::now();
        insert_follow(&h.repo, "viewer", "friend").await;
        insert_post(&h.repo, "p_friend_old", "friend", now - chrono::Duration::hours(3), "public", (9, 9, 9)).await;
        insert_post(&h.repo, "p_friend_new", "friend", now - chrono::Duration::hours(1), "followers", (0, 0, 0)).await;
        insert_post(&h.repo, "p_own", "viewer", now - chrono::Duration::hours(2), "private", (0, 0, 0)).await;
        insert_post(&h.repo, "p_stranger", "stranger", now, "public", (99, 99, 99)).await;

        let page = h.service.get_following_feed("viewer", 1, 10).await.unwrap();
        assert_eq!(page.posts, vec!["p_friend_new", "p_own", "p_friend_old"]);
        assert_eq!(page.pagination.total_count, 3);
    }

    #[tokio::test]
    async fn following_feed_paginates_with_offset() {
        let h = setup("svc_following_pages").await;
        let now = Utc::now();
        insert_follow(&h.repo, "viewer", "friend").await;
        for i in 0..5 {
            insert_post(
                &h.repo,
                &format!("p{i}"),
                "friend",
                now - chrono::Duration::minutes(i),
                "public",
                (0, 0, 0),
            )
            .await;
        }

        let first = h.service.get_following_feed("viewer", 1, 2).await.unwrap();
        let second = h.service.get_following_feed("viewer", 2, 2).await.unwrap();
        assert_eq!(first.posts, vec!["p0", "p1"]);
        assert_eq!(second.posts, vec!["p2", "p3"]);
        assert!(first.pagination.has_more);
        assert!(second.pagination.has_more);
    }

    #[tokio::test]
    async fn discover_feed_ranks_public_posts_by_engagement() {
        let h = setup("svc_discover").await;
        let now = Utc::now();
        insert_post(&h.repo, "p_viral", "a", now - chrono::Duration::hours(1), "public", (100, 20, 10)).await;
        insert_post(&h.repo, "p_quiet", "b", now - chrono::Duration::hours(2), "public", (1, 0, 0)).await;
        insert_post(&h.repo, "p_private", "c", now, "followers", (999, 0, 0)).await;
        insert_post(&h.repo, "p_stale", "d", now - chrono::Duration::days(5), "public", (500, 0, 0)).await;

        let feed = h.service.get_discover_feed(10).await.unwrap();
        let ids: Vec<&str> = feed.iter().map(|r| r.post_id.as_str()).collect();
        assert_eq!(ids, vec!["p_viral", "p_quiet"]);
        assert!(feed[0].score > feed[1].score);
    }

    #[tokio::test]
    async fn trending_feed_scores_velocity_within_the_timeframe() {
        let h = setup("svc_trending").await;
        let now = Utc::now();
        insert_post(&h.repo, "p_today", "a", now - chrono::Duration::hours(2), "public", (24, 0, 0)).await;
        insert_post(&h.repo, "p_last_week", "b", now - chrono::Duration::days(3), "public", (240, 0, 0)).await;

        let day = h
            .service
            .get_trending_feed(TrendingTimeframe::Day, 10)
            .await
            .unwrap();
        let ids: Vec<&str> = day.iter().map(|r| r.post_id.as_str()).collect();
        assert_eq!(ids, vec!["p_today"]);
        assert!((day[0].score - 1.0).abs() < 1e-9, "24 engagement / 24h = 1.0");

        let week = h
            .service
            .get_trending_feed(TrendingTimeframe::Week, 10)
            .await
            .unwrap();
        let ids: Vec<&str> = week.iter().map(|r| r.post_id.as_str()).collect();
        assert_eq!(ids, vec!["p_last_week", "p_today"]);
    }

    #[tokio::test]
    async fn zero_limit_variants_short_circuit() {
        let h = setup("svc_zero_limit").await;
        assert!(h.service.get_discover_feed(0).await.unwrap().is_empty());
        assert!(h
            .service
            .get_trending_feed(TrendingTimeframe::Hour, 0)
            .await
            .unwrap()
            .is_empty());
    }
}
