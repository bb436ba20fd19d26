use async_trait::async_trait;

use crate::domain::{FeedEntry, Source};
use crate::errors::AlertResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch and parse every entry currently published by `source`, in feed order
    async fn fetch(&self, source: &Source) -> AlertResult<Vec<FeedEntry>>;
}
