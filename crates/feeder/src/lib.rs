//! # Feeder
//!
//! Capacity-bounded, time-ordered activity feeds per user, with unread
//! tracking against a last-read watermark.
//!
//! A [`Feed`] binds a policy (name, `max_size`, `per_page`) to a shared
//! [`OrderedEventStore`](feeder_storage::OrderedEventStore). A
//! [`UserActivity`] fixes the user and adds the read-side behavior: reading a
//! page marks the feed read, and an unreadable watermark counts everything as
//! unread.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use feeder::{Feed, UserActivity};
//! use feeder_storage::InMemoryEventStore;
//!
//! let feed = Arc::new(Feed::new("notifications", 17, 10, Arc::new(InMemoryEventStore::new())));
//! let activity = UserActivity::new("okandas", feed);
//!
//! activity.store("liked your post", feeder_core::unix_now()).await?;
//! let unread = activity.unread_count().await?;
//! let first_page = activity.page(1).await?;
//! ```

pub mod activity;
pub mod cli;
pub mod config;
pub mod feed;

pub use activity::UserActivity;
pub use config::{ConfigError, FeedConfig, FeederConfig, StoreConfig, StoreEngine};
pub use feed::Feed;

pub use feeder_core::{EventRecord, FeedMeta, FeedSummary, UserId, unix_now};
pub use feeder_storage::{OrderedEventStore, StorageError};
