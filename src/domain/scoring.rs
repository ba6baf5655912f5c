use crate::domain::entities::{EngagementSnapshot, PostCandidate};
use crate::shared::config::ScoringConfig;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A candidate together with the score one refresh run assigned to it.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: PostCandidate,
    pub score: f64,
}

/// Weighted engagement signal. Comments and shares count above raw
/// reactions because they represent stronger engagement.
pub fn weighted_engagement(engagement: &EngagementSnapshot, params: &ScoringConfig) -> u64 {
    engagement.reactions
        + params.comment_weight * engagement.comments
        + params.share_weight * engagement.shares
}

/// Log-damped engagement component, always >= 1. The damping keeps viral
/// posts from totally dominating a timeline.
pub fn base_engagement(engagement: &EngagementSnapshot, params: &ScoringConfig) -> f64 {
    1.0 + (1.0 + weighted_engagement(engagement, params) as f64).ln()
}

fn relationship_multiplier(
    candidate: &PostCandidate,
    viewer_id: &str,
    params: &ScoringConfig,
) -> f64 {
    if candidate.is_followed_author {
        params.followed_multiplier
    } else if candidate.author_id == viewer_id {
        params.own_post_multiplier
    } else {
        1.0
    }
}

/// Smooth hyperbolic decay over post age; no hard cutoff.
pub fn recency_decay(created_at: DateTime<Utc>, now: DateTime<Utc>, params: &ScoringConfig) -> f64 {
    let age_millis = (now - created_at).num_milliseconds().max(0);
    let hours = age_millis as f64 / 3_600_000.0;
    1.0 / (1.0 + hours / params.half_life_hours)
}

/// Pure scoring function: identical inputs and `now` always yield an
/// identical score.
pub fn score(
    candidate: &PostCandidate,
    viewer_id: &str,
    now: DateTime<Utc>,
    params: &ScoringConfig,
) -> f64 {
    base_engagement(&candidate.engagement, params)
        * relationship_multiplier(candidate, viewer_id, params)
        * recency_decay(candidate.created_at, now, params)
}

/// Deterministic ranking order: score descending, then created_at
/// descending, then post_id descending.
pub fn compare_ranked(
    a: (f64, DateTime<Utc>, &str),
    b: (f64, DateTime<Utc>, &str),
) -> Ordering {
    b.0.partial_cmp(&a.0)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.1.cmp(&a.1))
        .then_with(|| b.2.cmp(a.2))
}

/// Sorts scored candidates into ranking order in place.
pub fn rank(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| {
        compare_ranked(
            (a.score, a.candidate.created_at, a.candidate.post_id.as_str()),
            (b.score, b.candidate.created_at, b.candidate.post_id.as_str()),
        )
    });
}
