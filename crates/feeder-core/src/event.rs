//! Feed event records

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// A single entry in a user's feed
///
/// Records are ordered by `at` first and `value` second, which is the order
/// they are kept in an ordered set. Two records with the same `(value, at)`
/// pair are the same element: storing one twice does not grow the feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRecord {
    /// Opaque payload, never interpreted by the engine
    pub value: String,
    /// Unix timestamp (seconds); the sort key
    pub at: i64,
}

impl EventRecord {
    /// Create a new event record
    pub fn new(value: impl Into<String>, at: i64) -> Self {
        Self {
            value: value.into(),
            at,
        }
    }

    /// Create a record stamped with the current wall-clock time
    pub fn now(value: impl Into<String>) -> Self {
        Self::new(value, crate::unix_now())
    }
}

impl Ord for EventRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .cmp(&other.at)
            .then_with(|| self.value.cmp(&other.value))
    }
}

impl PartialOrd for EventRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Serializable snapshot of a user's feed state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSummary {
    /// The user the feed belongs to
    pub user_id: UserId,
    /// Name of the feed
    pub feed: String,
    /// Maintained total event count
    pub count: i64,
    /// Live count of events at or after `last_read`
    pub unread: u64,
    /// Last-read watermark (Unix seconds)
    pub last_read: i64,
}
