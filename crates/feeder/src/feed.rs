//! Feed policy
//!
//! A [`Feed`] binds a name, a capacity bound and a default page size to a
//! shared store. It holds no mutable state of its own; every operation passes
//! straight through to the store with the feed's policy applied.

use std::fmt;
use std::sync::Arc;

use feeder_core::{FeedMeta, UserId};
use feeder_storage::{OrderedEventStore, StorageError};
use tracing::instrument;

/// A named, capacity-bounded, time-ordered feed
#[derive(Clone)]
pub struct Feed {
    name: String,
    max_size: usize,
    per_page: usize,
    store: Arc<dyn OrderedEventStore>,
}

impl Feed {
    /// Bind a feed policy to a store. Performs no I/O.
    pub fn new(
        name: impl Into<String>,
        max_size: usize,
        per_page: usize,
        store: Arc<dyn OrderedEventStore>,
    ) -> Self {
        Self {
            name: name.into(),
            max_size,
            per_page,
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of events kept per user
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Default page size
    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// The store backing this feed
    pub fn backend(&self) -> &Arc<dyn OrderedEventStore> {
        &self.store
    }

    /// Liveness check of the backing store
    pub async fn health_check(&self) -> Result<String, StorageError> {
        self.store.health_check().await
    }

    /// Add an event, evicting the oldest beyond `max_size`.
    ///
    /// Returns the net change in event count.
    #[instrument(skip_all, fields(feed = %self.name, user = %user, at = at))]
    pub async fn store(&self, user: &UserId, value: &str, at: i64) -> Result<i64, StorageError> {
        self.store.store(user, value, at, self.max_size).await
    }

    /// Remove the event with this exact value and timestamp
    #[instrument(skip_all, fields(feed = %self.name, user = %user, at = at))]
    pub async fn delete(&self, user: &UserId, value: &str, at: i64) -> Result<u64, StorageError> {
        self.store.delete(user, value, at).await
    }

    /// Drop all of the user's events. Counters are left as they are.
    #[instrument(skip_all, fields(feed = %self.name, user = %user))]
    pub async fn wipe(&self, user: &UserId) -> Result<u64, StorageError> {
        self.store.wipe(user).await
    }

    pub async fn all(&self, user: &UserId) -> Result<Vec<String>, StorageError> {
        self.store.all(user).await
    }

    /// One page of events, newest first, with an explicit page size
    #[instrument(skip_all, fields(feed = %self.name, user = %user, page = page, per_page = per_page))]
    pub async fn paginate(
        &self,
        user: &UserId,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<String>, StorageError> {
        self.store.paginate(user, page, per_page).await
    }

    /// One page of events using the feed's default page size
    pub async fn page(&self, user: &UserId, page: usize) -> Result<Vec<String>, StorageError> {
        self.paginate(user, page, self.per_page).await
    }

    pub async fn count(&self, user: &UserId) -> Result<i64, StorageError> {
        self.store.count(user).await
    }

    /// Number of events at or after `at`
    pub async fn unread(&self, user: &UserId, at: i64) -> Result<u64, StorageError> {
        self.store.unread(user, at).await
    }

    #[instrument(skip_all, fields(feed = %self.name, user = %user, at = at))]
    pub async fn reset_last_read(&self, user: &UserId, at: i64) -> Result<bool, StorageError> {
        self.store.reset_last_read(user, at).await
    }

    pub async fn last_read(&self, user: &UserId) -> Result<i64, StorageError> {
        self.store.last_read(user).await
    }

    /// Overwrite the total counter with the real event count.
    ///
    /// Returns 0 on success.
    #[instrument(skip_all, fields(feed = %self.name, user = %user))]
    pub async fn recalculate_count(&self, user: &UserId) -> Result<i64, StorageError> {
        self.store.recalculate_count(user).await
    }

    pub async fn meta(&self, user: &UserId) -> Result<FeedMeta, StorageError> {
        self.store.meta(user).await
    }
}

impl fmt::Debug for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feed")
            .field("name", &self.name)
            .field("max_size", &self.max_size)
            .field("per_page", &self.per_page)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feeder_storage::InMemoryEventStore;

    fn feed(name: &str, max_size: usize, per_page: usize) -> Feed {
        Feed::new(name, max_size, per_page, Arc::new(InMemoryEventStore::new()))
    }

    #[test]
    fn test_new_feed() {
        for (name, max_size, per_page) in [("notifications", 5, 2), ("news", 6, 4)] {
            let feed = feed(name, max_size, per_page);
            assert_eq!(feed.name(), name);
            assert_eq!(feed.max_size(), max_size);
            assert_eq!(feed.per_page(), per_page);
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(feed("health", 5, 2).health_check().await.unwrap(), "PONG");
    }

    #[tokio::test]
    async fn test_store_applies_max_size() {
        let feed = feed("notifications", 3, 10);
        let user = UserId::new("okandas");

        for at in 1..=3 {
            assert_eq!(feed.store(&user, &format!("e{at}"), at).await.unwrap(), 1);
        }
        // Full feed: one in, one out
        assert_eq!(feed.store(&user, "e4", 4).await.unwrap(), 0);

        assert_eq!(feed.all(&user).await.unwrap(), vec!["e4", "e3", "e2"]);
        assert_eq!(feed.count(&user).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_page_uses_default_per_page() {
        let feed = feed("notifications", 10, 2);
        let user = UserId::new("okandas");
        for at in 1..=5 {
            feed.store(&user, &format!("e{at}"), at).await.unwrap();
        }

        assert_eq!(feed.page(&user, 1).await.unwrap(), vec!["e5", "e4"]);
        assert_eq!(feed.page(&user, 3).await.unwrap(), vec!["e1"]);
        assert!(feed.page(&user, 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_max_size_is_rejected() {
        let feed = feed("broken", 0, 10);
        let err = feed
            .store(&UserId::new("okandas"), "e", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[tokio::test]
    async fn test_feeds_share_a_store() {
        let store: Arc<dyn OrderedEventStore> = Arc::new(InMemoryEventStore::new());
        let small = Feed::new("small", 2, 10, Arc::clone(&store));
        let large = Feed::new("large", 10, 10, Arc::clone(&store));
        let user = UserId::new("okandas");

        large.store(&user, "a", 1).await.unwrap();
        large.store(&user, "b", 2).await.unwrap();
        small.store(&user, "c", 3).await.unwrap();

        // Eviction follows the bound of the feed that stored
        assert_eq!(large.all(&user).await.unwrap(), vec!["c", "b"]);
    }

    #[test]
    fn test_debug_omits_store() {
        let rendered = format!("{:?}", feed("notifications", 17, 10));
        assert!(rendered.contains("notifications"));
        assert!(rendered.contains("17"));
    }
}
