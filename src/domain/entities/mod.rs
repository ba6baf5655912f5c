pub mod cache_entry;
pub mod candidate;
pub mod feed_page;

pub use cache_entry::{CacheEntry, CacheStats};
pub use candidate::{EngagementSnapshot, PostCandidate};
pub use feed_page::{FollowingPage, Pagination, RankedPostRef, TimelinePage, TrendingTimeframe};
