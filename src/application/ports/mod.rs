pub mod cache_store;
pub mod candidate_source;
pub mod feed_queries;

pub use cache_store::{
    validate_min_score, validate_paging, GenerationMeta, TimelineCacheStore, TimelineSlice,
    MAX_PAGE_SIZE,
};
pub use candidate_source::CandidateSource;
pub use feed_queries::{ChronoPage, FeedQueries};
