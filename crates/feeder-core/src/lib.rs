//! # Feeder Core
//!
//! Shared types for the Feeder activity feed engine.
//!
//! - [`UserId`]: the identity a feed belongs to
//! - [`EventRecord`]: a single feed entry, a payload scored by its timestamp
//! - [`FeedMeta`]: the per-user counters and last-read watermark
//! - [`FeedSummary`]: a serializable view of a user's feed state

pub mod event;
pub mod identity;
pub mod meta;

pub use event::{EventRecord, FeedSummary};
pub use identity::UserId;
pub use meta::{FeedMeta, LAST_READ, TOTAL_COUNT, UNREAD_COUNT};

/// Current wall-clock time as a Unix timestamp in seconds
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
