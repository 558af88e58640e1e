//! Per-user view over a feed

use std::sync::Arc;

use feeder_core::{FeedMeta, FeedSummary, UserId, unix_now};
use feeder_storage::StorageError;
use tracing::{debug, warn};

use crate::feed::Feed;

/// A user's activity in one feed
///
/// Fixes the user id so callers work with a single handle. Reading a page
/// marks the feed as read up to the current wall-clock time.
#[derive(Debug, Clone)]
pub struct UserActivity {
    user_id: UserId,
    feed: Arc<Feed>,
}

impl UserActivity {
    pub fn new(user_id: impl Into<UserId>, feed: Arc<Feed>) -> Self {
        Self {
            user_id: user_id.into(),
            feed,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn feed(&self) -> &Arc<Feed> {
        &self.feed
    }

    /// Remove all of this user's events from the feed
    pub async fn wipe(&self) -> Result<u64, StorageError> {
        self.feed.wipe(&self.user_id).await
    }

    pub async fn store(&self, value: &str, at: i64) -> Result<i64, StorageError> {
        self.feed.store(&self.user_id, value, at).await
    }

    pub async fn delete(&self, value: &str, at: i64) -> Result<u64, StorageError> {
        self.feed.delete(&self.user_id, value, at).await
    }

    pub async fn count(&self) -> Result<i64, StorageError> {
        self.feed.count(&self.user_id).await
    }

    pub async fn reset_last_read(&self, at: i64) -> Result<bool, StorageError> {
        self.feed.reset_last_read(&self.user_id, at).await
    }

    pub async fn last_read(&self) -> Result<i64, StorageError> {
        self.feed.last_read(&self.user_id).await
    }

    /// Events at or after the last-read watermark.
    ///
    /// An unreadable watermark counts as 0, so everything is unread.
    pub async fn unread_count(&self) -> Result<u64, StorageError> {
        let last_read = match self.feed.last_read(&self.user_id).await {
            Ok(at) => at,
            Err(e) => {
                warn!(user = %self.user_id, error = %e, "failed to get last read, counting all events");
                0
            }
        };

        self.feed.unread(&self.user_id, last_read).await
    }

    /// Fetch a page and mark the feed read as of now.
    ///
    /// A failed mark-read is logged; the page is still returned.
    pub async fn paginate(&self, page: usize, per_page: usize) -> Result<Vec<String>, StorageError> {
        let events = self.feed.paginate(&self.user_id, page, per_page).await?;
        self.mark_read().await;
        Ok(events)
    }

    /// Fetch a page using the feed's default page size
    pub async fn page(&self, page: usize) -> Result<Vec<String>, StorageError> {
        self.paginate(page, self.feed.per_page()).await
    }

    pub async fn all(&self) -> Result<Vec<String>, StorageError> {
        self.feed.all(&self.user_id).await
    }

    /// Reconcile the total counter with the stored events
    pub async fn recalculate_count(&self) -> Result<i64, StorageError> {
        self.feed.recalculate_count(&self.user_id).await
    }

    pub async fn meta(&self) -> Result<FeedMeta, StorageError> {
        self.feed.meta(&self.user_id).await
    }

    /// Snapshot of count, unread count and watermark
    pub async fn summary(&self) -> Result<FeedSummary, StorageError> {
        let count = self.count().await?;
        let unread = self.unread_count().await?;
        let last_read = self.last_read().await?;

        Ok(FeedSummary {
            user_id: self.user_id.clone(),
            feed: self.feed.name().to_string(),
            count,
            unread,
            last_read,
        })
    }

    async fn mark_read(&self) {
        match self.feed.reset_last_read(&self.user_id, unix_now()).await {
            Ok(marked) => debug!(user = %self.user_id, marked, "user has read feed"),
            Err(e) => warn!(user = %self.user_id, error = %e, "failed to mark feed as read"),
        }
    }
}
