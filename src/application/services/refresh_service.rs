use crate::application::ports::{CandidateSource, TimelineCacheStore};
use crate::domain::entities::{CacheEntry, CacheStats};
use crate::domain::scoring::{self, ScoredCandidate};
use crate::shared::config::{CacheConfig, ScoringConfig};
use crate::shared::error::FeedError;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Per-viewer refresh bookkeeping: a lock serializing recomputation and a
/// counter of completed runs used to collapse waiters onto a finished run.
struct ViewerSlot {
    lock: tokio::sync::Mutex<()>,
    completed_runs: AtomicU64,
}

impl ViewerSlot {
    fn new() -> Self {
        Self {
            lock: tokio::sync::Mutex::new(()),
            completed_runs: AtomicU64::new(0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshRunStats {
    pub entries_created: u64,
    pub candidate_count: u64,
    pub computed_at_millis: i64,
    pub expires_at_millis: i64,
}

/// Orchestrates candidate selection, scoring, and cache materialization for
/// one viewer at a time. Refreshes for different viewers run in parallel;
/// concurrent refreshes for the same viewer collapse into one effective
/// recomputation.
pub struct RefreshService {
    candidate_source: Arc<dyn CandidateSource>,
    cache_store: Arc<dyn TimelineCacheStore>,
    cache_config: CacheConfig,
    scoring_config: ScoringConfig,
    slots: Mutex<HashMap<String, Arc<ViewerSlot>>>,
}

impl RefreshService {
    pub fn new(
        candidate_source: Arc<dyn CandidateSource>,
        cache_store: Arc<dyn TimelineCacheStore>,
        cache_config: CacheConfig,
        scoring_config: ScoringConfig,
    ) -> Self {
        Self {
            candidate_source,
            cache_store,
            cache_config,
            scoring_config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn viewer_slot(&self, viewer_id: &str) -> Arc<ViewerSlot> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .entry(viewer_id.to_string())
            .or_insert_with(|| Arc::new(ViewerSlot::new()))
            .clone()
    }

    /// Drops the caller's handle and removes the map entry once no other
    /// caller holds the slot, so the map only tracks viewers with a
    /// refresh in flight.
    fn release_slot(&self, viewer_id: &str, slot: Arc<ViewerSlot>) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        drop(slot);
        if let Some(current) = slots.get(viewer_id) {
            // Only the map's own handle left; nobody can clone it while we
            // hold the map lock.
            if Arc::strong_count(current) == 1 {
                slots.remove(viewer_id);
            }
        }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Recomputes the viewer's timeline generation and returns the number
    /// of entries written. Waits for an in-flight refresh of the same
    /// viewer and reuses its result instead of recomputing.
    pub async fn refresh(&self, viewer_id: &str) -> Result<u64, FeedError> {
        let slot = self.viewer_slot(viewer_id);
        let result = self.refresh_locked(viewer_id, &slot).await;
        self.release_slot(viewer_id, slot);
        result
    }

    async fn refresh_locked(&self, viewer_id: &str, slot: &ViewerSlot) -> Result<u64, FeedError> {
        let runs_before = slot.completed_runs.load(Ordering::Acquire);
        let _guard = slot.lock.lock().await;

        if slot.completed_runs.load(Ordering::Acquire) != runs_before {
            // Someone finished a run while we waited; serve its generation.
            if let Some(meta) = self.cache_store.current_generation(viewer_id).await? {
                tracing::debug!(viewer_id, "refresh collapsed onto completed run");
                return Ok(meta.entry_count);
            }
        }

        let result = self.run_guarded(viewer_id).await;
        if result.is_ok() {
            slot.completed_runs.fetch_add(1, Ordering::Release);
        }
        result
    }

    /// Fail-fast variant: returns `RefreshInProgress` instead of waiting
    /// when another refresh for the viewer holds the lock. Callers treat
    /// that as "serve the existing cache, retry later".
    pub async fn try_refresh(&self, viewer_id: &str) -> Result<u64, FeedError> {
        let slot = self.viewer_slot(viewer_id);
        let result = match slot.lock.try_lock() {
            Ok(_guard) => {
                let result = self.run_guarded(viewer_id).await;
                if result.is_ok() {
                    slot.completed_runs.fetch_add(1, Ordering::Release);
                }
                result
            }
            Err(_) => Err(FeedError::RefreshInProgress(viewer_id.to_string())),
        };
        self.release_slot(viewer_id, slot);
        result
    }

    async fn run_guarded(&self, viewer_id: &str) -> Result<u64, FeedError> {
        let started = Instant::now();
        let budget = std::time::Duration::from_secs(self.cache_config.refresh_timeout_secs);

        let stats = match tokio::time::timeout(budget, self.execute(viewer_id)).await {
            Ok(Ok(stats)) => stats,
            Ok(Err(err)) => return Err(FeedError::RefreshFailed(err.to_string())),
            Err(_) => {
                return Err(FeedError::RefreshFailed(format!(
                    "timed out after {}s",
                    self.cache_config.refresh_timeout_secs
                )))
            }
        };

        let duration_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
        tracing::info!(
            target: "feedline::refresh",
            viewer_id,
            entries_created = stats.entries_created,
            candidate_count = stats.candidate_count,
            computed_at_millis = stats.computed_at_millis,
            expires_at_millis = stats.expires_at_millis,
            duration_ms,
            "timeline refresh completed"
        );

        Ok(stats.entries_created)
    }

    /// One generation build: every entry is scored against the same `now`
    /// so the ranking is internally consistent. Nothing is written unless
    /// the whole pipeline succeeds.
    async fn execute(&self, viewer_id: &str) -> Result<RefreshRunStats, FeedError> {
        let now = Utc::now();
        let cap = self.cache_config.generation_size_max;

        let candidates = self
            .candidate_source
            .candidates(viewer_id, cap, now)
            .await?;
        let candidate_count = candidates.len() as u64;

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| {
                let score = scoring::score(&candidate, viewer_id, now, &self.scoring_config);
                ScoredCandidate { candidate, score }
            })
            .collect();
        scoring::rank(&mut scored);
        scored.truncate(cap);

        let expires_at = now + Duration::seconds(self.cache_config.ttl_secs as i64);
        let entries: Vec<CacheEntry> = scored
            .into_iter()
            .map(|s| CacheEntry {
                viewer_id: viewer_id.to_string(),
                post_id: s.candidate.post_id,
                score: s.score,
                post_created_at: s.candidate.created_at,
                computed_at: now,
                expires_at,
            })
            .collect();

        self.cache_store
            .replace(viewer_id, now, expires_at, &entries)
            .await?;

        Ok(RefreshRunStats {
            entries_created: entries.len() as u64,
            candidate_count,
            computed_at_millis: now.timestamp_millis(),
            expires_at_millis: expires_at.timestamp_millis(),
        })
    }

    /// Garbage-collects expired, superseded cache rows.
    pub async fn cleanup(&self, now: DateTime<Utc>) -> Result<u64, FeedError> {
        let deleted = self.cache_store.sweep(now).await?;
        tracing::info!(
            target: "feedline::refresh",
            deleted_count = deleted,
            cutoff_millis = now.timestamp_millis(),
            "cache sweep completed"
        );
        Ok(deleted)
    }

    pub async fn stats(&self, viewer_id: &str) -> Result<Option<CacheStats>, FeedError> {
        self.cache_store.stats(viewer_id, Utc::now()).await
    }
}
