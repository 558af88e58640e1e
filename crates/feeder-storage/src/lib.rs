//! # Feeder Storage
//!
//! Storage backends for per-user activity feeds.
//!
//! A feed is a capacity-bounded set of [`EventRecord`]s ordered by timestamp,
//! kept next to a small metadata map holding the total count, an unread
//! counter, and the last-read watermark.
//!
//! ## Features
//!
//! - **OrderedEventStore trait**: the contract every backend satisfies
//! - **InMemoryEventStore**: `DashMap`-backed implementation for tests and
//!   single-process use
//! - **RedbEventStore**: persistent implementation on top of redb
//! - **CapacityPolicy / PageWindow**: eviction and pagination rules shared by
//!   the backends
//!
//! ## Example
//!
//! ```rust,ignore
//! use feeder_core::UserId;
//! use feeder_storage::{InMemoryEventStore, OrderedEventStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = InMemoryEventStore::new();
//!     let user = UserId::new("okandas");
//!
//!     // Store an event in a feed bounded at 17 entries
//!     let delta = store.store(&user, "followed you", 1_700_000_000, 17).await.unwrap();
//!     assert_eq!(delta, 1);
//!
//!     // Newest first
//!     let page = store.paginate(&user, 1, 10).await.unwrap();
//!     assert_eq!(page, vec!["followed you".to_string()]);
//! }
//! ```

pub mod capacity;
pub mod error;
pub mod keys;
pub mod memory;
pub mod persistent;
pub mod tables;

// Re-exports
pub use capacity::{CapacityPolicy, PageWindow};
pub use error::StorageError;
pub use memory::InMemoryEventStore;
pub use persistent::RedbEventStore;
pub use tables::{RedbStorage, RedbStorageConfig};

pub use feeder_core::{EventRecord, FeedMeta, UserId};

use async_trait::async_trait;

/// Sentinel returned by a successful health check
pub const HEALTH_SENTINEL: &str = "PONG";

/// Contract for a backend holding bounded, timestamp-ordered feeds
///
/// Each user owns one ordered set of events (scored by `at`) and one
/// metadata map. `store` keeps the set within its bound and moves the
/// counters by the same delta; `delete` and `wipe` leave the counters alone,
/// and [`recalculate_count`](Self::recalculate_count) reconciles them.
#[async_trait]
pub trait OrderedEventStore: Send + Sync {
    /// Liveness check; returns [`HEALTH_SENTINEL`] on success
    async fn health_check(&self) -> Result<String, StorageError>;

    /// Insert an event scored by `at`, evicting the oldest events beyond
    /// `max_size`
    ///
    /// Returns the delta `added - evicted`. Storing an existing
    /// `(value, at)` pair adds nothing.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `max_size` is zero, or a backend error
    /// if the store fails.
    async fn store(
        &self,
        user: &UserId,
        value: &str,
        at: i64,
        max_size: usize,
    ) -> Result<i64, StorageError>;

    /// Remove the event matching `(value, at)` exactly
    ///
    /// Returns the number of events removed (0 or 1). Counters are not
    /// adjusted.
    async fn delete(&self, user: &UserId, value: &str, at: i64) -> Result<u64, StorageError>;

    /// Delete the user's whole event set
    ///
    /// Returns the number of sets removed (0 or 1). Metadata is kept, so
    /// the total counter stays stale until recalculated.
    async fn wipe(&self, user: &UserId) -> Result<u64, StorageError>;

    /// All payloads, newest first
    async fn all(&self, user: &UserId) -> Result<Vec<String>, StorageError>;

    /// One page of payloads, newest first
    ///
    /// `page` is 1-based. Does not touch the last-read watermark.
    async fn paginate(
        &self,
        user: &UserId,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<String>, StorageError>;

    /// The maintained total counter (not a live recount)
    async fn count(&self, user: &UserId) -> Result<i64, StorageError>;

    /// Live count of events with a timestamp at or after `at`
    async fn unread(&self, user: &UserId, at: i64) -> Result<u64, StorageError>;

    /// Overwrite the last-read watermark
    async fn reset_last_read(&self, user: &UserId, at: i64) -> Result<bool, StorageError>;

    /// The last-read watermark, 0 if never set
    async fn last_read(&self, user: &UserId) -> Result<i64, StorageError>;

    /// Overwrite the total counter with the true size of the event set
    ///
    /// Returns 0 on success.
    async fn recalculate_count(&self, user: &UserId) -> Result<i64, StorageError>;

    /// Read the whole metadata map
    async fn meta(&self, user: &UserId) -> Result<FeedMeta, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the OrderedEventStore trait is object-safe
    fn _assert_object_safe(_: &dyn OrderedEventStore) {}

    #[tokio::test]
    async fn test_in_memory_store_as_trait_object() {
        let store: Box<dyn OrderedEventStore> = Box::new(InMemoryEventStore::new());
        let user = UserId::new("okandas");

        assert_eq!(store.health_check().await.unwrap(), HEALTH_SENTINEL);

        for at in 1..=4 {
            store.store(&user, &format!("event {at}"), at, 3).await.unwrap();
        }

        assert_eq!(store.count(&user).await.unwrap(), 3);
        assert_eq!(
            store.all(&user).await.unwrap(),
            vec!["event 4", "event 3", "event 2"]
        );
    }
}
