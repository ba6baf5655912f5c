use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Candidate source unavailable: {0}")]
    CandidateSourceUnavailable(String),

    #[error("Refresh already in progress: {0}")]
    RefreshInProgress(String),

    #[error("Refresh failed: {0}")]
    RefreshFailed(String),

    /// Control-flow signal: no non-expired generation exists for the
    /// viewer. Consumed by the feed reader, never surfaced to callers.
    #[error("Cache miss")]
    CacheMiss,

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Invalid min_score: {0}")]
    InvalidMinScore(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FeedError {
    /// True for failures a caller may retry without changing the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FeedError::CandidateSourceUnavailable(_)
                | FeedError::RefreshInProgress(_)
                | FeedError::RefreshFailed(_)
                | FeedError::Database(_)
        )
    }
}

impl From<sqlx::Error> for FeedError {
    fn from(err: sqlx::Error) -> Self {
        FeedError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for FeedError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        FeedError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
