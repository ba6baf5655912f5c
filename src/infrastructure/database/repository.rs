use crate::shared::error::FeedError;
use async_trait::async_trait;

#[async_trait]
pub trait Repository: Send + Sync {
    async fn initialize(&self) -> Result<(), FeedError>;
    async fn health_check(&self) -> Result<bool, FeedError>;
}
