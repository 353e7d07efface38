// Repository trait for the per-frame feed sink
use crate::domain::feed::{FeedEvent, InsertedFeedRecord};
use async_trait::async_trait;

#[async_trait]
pub trait FeedRepository: Send + Sync {
    /// Append one feed event, returning the stored row
    async fn insert(&self, event: &FeedEvent) -> anyhow::Result<InsertedFeedRecord>;

    /// Remove every stored feed event
    async fn truncate(&self) -> anyhow::Result<()>;
}
