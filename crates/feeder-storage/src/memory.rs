//! In-memory storage implementation
//!
//! Suitable for testing and single-process deployments. Each user's events
//! and metadata live in one `DashMap` entry, so a store (add, trim, count)
//! runs under a single shard lock and is atomic per user.

use std::collections::BTreeSet;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, trace};

use feeder_core::{EventRecord, FeedMeta, UserId};

use crate::capacity::{CapacityPolicy, PageWindow};
use crate::error::StorageError;
use crate::{HEALTH_SENTINEL, OrderedEventStore};

/// One user's ordered events plus their metadata map
#[derive(Debug, Default)]
struct UserFeed {
    events: BTreeSet<EventRecord>,
    meta: FeedMeta,
}

/// In-memory implementation of OrderedEventStore
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    feeds: DashMap<UserId, UserFeed>,
}

impl InMemoryEventStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with any state (events or metadata)
    pub fn user_count(&self) -> usize {
        self.feeds.len()
    }

    /// Total events held across all users
    pub fn total_events(&self) -> usize {
        self.feeds.iter().map(|feed| feed.events.len()).sum()
    }
}

#[async_trait]
impl OrderedEventStore for InMemoryEventStore {
    async fn health_check(&self) -> Result<String, StorageError> {
        Ok(HEALTH_SENTINEL.to_string())
    }

    async fn store(
        &self,
        user: &UserId,
        value: &str,
        at: i64,
        max_size: usize,
    ) -> Result<i64, StorageError> {
        let policy = CapacityPolicy::new(max_size)?;

        let mut entry = self.feeds.entry(user.clone()).or_default();
        let feed = entry.value_mut();

        let added = i64::from(feed.events.insert(EventRecord::new(value, at)));

        let to_evict = policy.events_to_evict(feed.events.len());
        let evicted = policy.select_for_eviction(&feed.events, to_evict);
        for record in &evicted {
            feed.events.remove(record);
            debug!(user = %user, at = record.at, "Evicted event past feed capacity");
        }

        let delta = added - evicted.len() as i64;
        feed.meta.apply_delta(delta);

        trace!(user = %user, at, delta, "Stored event");
        Ok(delta)
    }

    async fn delete(&self, user: &UserId, value: &str, at: i64) -> Result<u64, StorageError> {
        let removed = match self.feeds.get_mut(user) {
            Some(mut feed) => u64::from(feed.events.remove(&EventRecord::new(value, at))),
            None => 0,
        };

        trace!(user = %user, at, removed, "Deleted event");
        Ok(removed)
    }

    async fn wipe(&self, user: &UserId) -> Result<u64, StorageError> {
        let removed = match self.feeds.get_mut(user) {
            Some(mut feed) if !feed.events.is_empty() => {
                feed.events.clear();
                1
            }
            _ => 0,
        };

        // Drop the entry entirely once nothing of the user is left
        self.feeds
            .remove_if(user, |_, feed| feed.events.is_empty() && feed.meta.is_empty());

        debug!(user = %user, removed, "Wiped feed events");
        Ok(removed)
    }

    async fn all(&self, user: &UserId) -> Result<Vec<String>, StorageError> {
        match self.feeds.get(user) {
            Some(feed) => Ok(feed.events.iter().rev().map(|r| r.value.clone()).collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn paginate(
        &self,
        user: &UserId,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<String>, StorageError> {
        let window = PageWindow::new(page, per_page)?;

        match self.feeds.get(user) {
            Some(feed) => Ok(feed
                .events
                .iter()
                .rev()
                .skip(window.start)
                .take(window.len)
                .map(|r| r.value.clone())
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn count(&self, user: &UserId) -> Result<i64, StorageError> {
        Ok(self
            .feeds
            .get(user)
            .map(|feed| feed.meta.total_count)
            .unwrap_or_default())
    }

    async fn unread(&self, user: &UserId, at: i64) -> Result<u64, StorageError> {
        // The empty string sorts first, so this is the lowest record scored `at`
        let floor = EventRecord::new(String::new(), at);

        Ok(self
            .feeds
            .get(user)
            .map(|feed| feed.events.range(floor..).count() as u64)
            .unwrap_or_default())
    }

    async fn reset_last_read(&self, user: &UserId, at: i64) -> Result<bool, StorageError> {
        self.feeds.entry(user.clone()).or_default().meta.last_read = at;

        trace!(user = %user, at, "Reset last read");
        Ok(true)
    }

    async fn last_read(&self, user: &UserId) -> Result<i64, StorageError> {
        Ok(self
            .feeds
            .get(user)
            .map(|feed| feed.meta.last_read)
            .unwrap_or_default())
    }

    async fn recalculate_count(&self, user: &UserId) -> Result<i64, StorageError> {
        // Unknown users have nothing to reconcile
        let Some(mut feed) = self.feeds.get_mut(user) else {
            return Ok(0);
        };

        let actual = feed.events.len() as i64;
        let correction = actual - feed.meta.total_count;
        feed.meta.total_count = actual;

        debug!(user = %user, actual, correction, "Recalculated total count");
        Ok(0)
    }

    async fn meta(&self, user: &UserId) -> Result<FeedMeta, StorageError> {
        Ok(self
            .feeds
            .get(user)
            .map(|feed| feed.meta)
            .unwrap_or_default())
    }
}
