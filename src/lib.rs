//! Personalized feed ranking and caching engine.
//!
//! Candidate posts are selected per viewer, scored with a pure engagement /
//! relationship / recency function, and materialized as swap-whole cache
//! generations in sqlite. Reads serve the current generation with
//! pagination and score filtering; a miss triggers a single-flight refresh.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{CandidateSource, FeedQueries, TimelineCacheStore};
pub use application::services::{RefreshService, TimelineService};
pub use domain::entities::{
    CacheEntry, CacheStats, EngagementSnapshot, FollowingPage, PostCandidate, RankedPostRef,
    TimelinePage, TrendingTimeframe,
};
pub use infrastructure::database::{ConnectionPool, Repository, SqliteRepository};
pub use shared::{FeedConfig, FeedError, Result};
