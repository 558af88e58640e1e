//! Per-user feed metadata
//!
//! Counters are kept next to the ordered event set in a small field map.
//! They are maintained incrementally on store and can drift after deletes
//! or wipes until they are recalculated.

use serde::{Deserialize, Serialize};

/// Field holding the maintained total event count
pub const TOTAL_COUNT: &str = "total_count";

/// Field holding the maintained unread counter
pub const UNREAD_COUNT: &str = "unread_count";

/// Field holding the last-read watermark
pub const LAST_READ: &str = "last_read";

/// Counters and watermark for one user's feed
///
/// Missing fields read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMeta {
    /// Running count of stored events
    pub total_count: i64,
    /// Running count of unread events, adjusted by store deltas
    pub unread_count: i64,
    /// Unix timestamp; events at or after it are unread
    pub last_read: i64,
}

impl FeedMeta {
    /// Apply a store delta to both counters
    pub fn apply_delta(&mut self, delta: i64) {
        self.total_count += delta;
        self.unread_count += delta;
    }

    /// Whether every field is still at its zero value
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
