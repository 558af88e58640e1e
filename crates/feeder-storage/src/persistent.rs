//! Persistent storage implementation on redb
//!
//! Events live in [`FEED_EVENTS`] keyed so that one user's events form a
//! contiguous, timestamp-ordered range (see [`crate::keys`]). Counters and
//! the watermark live in [`FEED_META`] as decimal strings.
//!
//! A store runs the insert, the capacity trim and both counter increments in
//! one write transaction, so concurrent stores for the same user cannot leave
//! the total counter out of step with the event set.

use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{ReadableTable, Table};
use tracing::{debug, trace};

use feeder_core::{FeedMeta, LAST_READ, TOTAL_COUNT, UNREAD_COUNT, UserId};

use crate::capacity::{CapacityPolicy, PageWindow};
use crate::error::StorageError;
use crate::keys;
use crate::tables::{FEED_EVENTS, FEED_META, RedbStorage, RedbStorageConfig};
use crate::{HEALTH_SENTINEL, OrderedEventStore};

type ByteTable<'txn> = Table<'txn, &'static [u8], &'static [u8]>;

// Event rows carry everything in the key
const EMPTY: &[u8] = &[];

/// Persistent implementation of OrderedEventStore
pub struct RedbEventStore {
    storage: Arc<RedbStorage>,
}

impl RedbEventStore {
    /// Wrap an already opened database
    pub fn new(storage: Arc<RedbStorage>) -> Self {
        Self { storage }
    }

    /// Open or create the database described by `config`
    pub fn open(config: RedbStorageConfig) -> Result<Self, StorageError> {
        Ok(Self::new(Arc::new(RedbStorage::open(config)?)))
    }

    /// Get the underlying storage manager
    pub fn storage(&self) -> &Arc<RedbStorage> {
        &self.storage
    }

    fn read_meta_field(&self, user: &UserId, field: &str) -> Result<i64, StorageError> {
        let raw = self.storage.read_meta(&keys::meta_key(user, field))?;
        match raw {
            Some(raw) => parse_field(field, &raw),
            None => Ok(0),
        }
    }
}

/// Range covering every key that starts with `lower`'s user prefix and is
/// at or above `lower`
fn user_range<'a>(
    lower: &'a [u8],
    upper: Option<&'a [u8]>,
) -> (Bound<&'a [u8]>, Bound<&'a [u8]>) {
    (
        Bound::Included(lower),
        upper.map_or(Bound::Unbounded, Bound::Excluded),
    )
}

/// Event keys in `[lower, upper)`, oldest first
fn scan_keys<T>(
    table: &T,
    lower: &[u8],
    upper: Option<&[u8]>,
) -> Result<Vec<Vec<u8>>, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let mut found = Vec::new();
    for entry in table
        .range::<&[u8]>(user_range(lower, upper))
        .map_err(StorageError::backend)?
    {
        let (key, _) = entry.map_err(StorageError::backend)?;
        found.push(key.value().to_vec());
    }
    Ok(found)
}

fn parse_field(field: &str, raw: &[u8]) -> Result<i64, StorageError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| {
            StorageError::parse(format!(
                "field {field} holds {:?}, not an integer",
                String::from_utf8_lossy(raw)
            ))
        })
}

fn read_field<T>(table: &T, user: &UserId, field: &str) -> Result<i64, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let key = keys::meta_key(user, field);
    match table.get(key.as_slice()).map_err(StorageError::backend)? {
        Some(raw) => parse_field(field, raw.value()),
        None => Ok(0),
    }
}

fn write_field(
    table: &mut ByteTable<'_>,
    user: &UserId,
    field: &str,
    value: i64,
) -> Result<(), StorageError> {
    let key = keys::meta_key(user, field);
    table
        .insert(key.as_slice(), value.to_string().as_bytes())
        .map_err(StorageError::backend)?;
    Ok(())
}

fn increment_field(
    table: &mut ByteTable<'_>,
    user: &UserId,
    field: &str,
    delta: i64,
) -> Result<i64, StorageError> {
    let next = read_field(&*table, user, field)? + delta;
    write_field(table, user, field, next)?;
    Ok(next)
}

#[async_trait]
impl OrderedEventStore for RedbEventStore {
    async fn health_check(&self) -> Result<String, StorageError> {
        let read_txn = self
            .storage
            .db()
            .begin_read()
            .map_err(StorageError::backend)?;
        read_txn
            .open_table(FEED_EVENTS)
            .map_err(StorageError::backend)?;
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
        let prefix = keys::user_prefix(user);
        let prefix_end = keys::prefix_end(&prefix);

        let write_txn = self
            .storage
            .db()
            .begin_write()
            .map_err(StorageError::backend)?;

        let delta = {
            let mut events = write_txn
                .open_table(FEED_EVENTS)
                .map_err(StorageError::backend)?;

            let key = keys::event_key(user, value, at);
            let added = events
                .insert(key.as_slice(), EMPTY)
                .map_err(StorageError::backend)?
                .is_none();

            let held = scan_keys(&events, &prefix, prefix_end.as_deref())?;
            let to_evict = policy.events_to_evict(held.len());
            for old in held.iter().take(to_evict) {
                events
                    .remove(old.as_slice())
                    .map_err(StorageError::backend)?;
            }
            if to_evict > 0 {
                debug!(user = %user, evicted = to_evict, "Evicted events past feed capacity");
            }

            let delta = i64::from(added) - to_evict as i64;

            let mut meta = write_txn
                .open_table(FEED_META)
                .map_err(StorageError::backend)?;
            increment_field(&mut meta, user, TOTAL_COUNT, delta)?;
            increment_field(&mut meta, user, UNREAD_COUNT, delta)?;

            delta
        };

        write_txn.commit().map_err(StorageError::backend)?;

        trace!(user = %user, at, delta, "Stored event");
        Ok(delta)
    }

    async fn delete(&self, user: &UserId, value: &str, at: i64) -> Result<u64, StorageError> {
        let write_txn = self
            .storage
            .db()
            .begin_write()
            .map_err(StorageError::backend)?;

        let removed = {
            let mut events = write_txn
                .open_table(FEED_EVENTS)
                .map_err(StorageError::backend)?;
            let key = keys::event_key(user, value, at);
            let removed = events
                .remove(key.as_slice())
                .map_err(StorageError::backend)?
                .is_some();
            removed
        };

        write_txn.commit().map_err(StorageError::backend)?;

        trace!(user = %user, at, removed, "Deleted event");
        Ok(u64::from(removed))
    }

    async fn wipe(&self, user: &UserId) -> Result<u64, StorageError> {
        let prefix = keys::user_prefix(user);
        let prefix_end = keys::prefix_end(&prefix);

        let write_txn = self
            .storage
            .db()
            .begin_write()
            .map_err(StorageError::backend)?;

        let removed = {
            let mut events = write_txn
                .open_table(FEED_EVENTS)
                .map_err(StorageError::backend)?;
            let held = scan_keys(&events, &prefix, prefix_end.as_deref())?;
            for key in &held {
                events
                    .remove(key.as_slice())
                    .map_err(StorageError::backend)?;
            }
            u64::from(!held.is_empty())
        };

        write_txn.commit().map_err(StorageError::backend)?;

        debug!(user = %user, removed, "Wiped feed events");
        Ok(removed)
    }

    async fn all(&self, user: &UserId) -> Result<Vec<String>, StorageError> {
        let prefix = keys::user_prefix(user);
        let prefix_end = keys::prefix_end(&prefix);

        let read_txn = self
            .storage
            .db()
            .begin_read()
            .map_err(StorageError::backend)?;
        let events = read_txn
            .open_table(FEED_EVENTS)
            .map_err(StorageError::backend)?;

        let mut values = Vec::new();
        for key in scan_keys(&events, &prefix, prefix_end.as_deref())?
            .iter()
            .rev()
        {
            values.push(keys::decode_event_key(prefix.len(), key)?.value);
        }
        Ok(values)
    }

    async fn paginate(
        &self,
        user: &UserId,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<String>, StorageError> {
        let window = PageWindow::new(page, per_page)?;
        let prefix = keys::user_prefix(user);
        let prefix_end = keys::prefix_end(&prefix);

        let read_txn = self
            .storage
            .db()
            .begin_read()
            .map_err(StorageError::backend)?;
        let events = read_txn
            .open_table(FEED_EVENTS)
            .map_err(StorageError::backend)?;

        let range = events
            .range::<&[u8]>(user_range(&prefix, prefix_end.as_deref()))
            .map_err(StorageError::backend)?;

        let mut values = Vec::with_capacity(window.len);
        for entry in range.rev().skip(window.start).take(window.len) {
            let (key, _) = entry.map_err(StorageError::backend)?;
            values.push(keys::decode_event_key(prefix.len(), key.value())?.value);
        }
        Ok(values)
    }

    async fn count(&self, user: &UserId) -> Result<i64, StorageError> {
        self.read_meta_field(user, TOTAL_COUNT)
    }

    async fn unread(&self, user: &UserId, at: i64) -> Result<u64, StorageError> {
        let floor = keys::score_floor(user, at);
        let prefix_end = keys::prefix_end(&keys::user_prefix(user));

        let read_txn = self
            .storage
            .db()
            .begin_read()
            .map_err(StorageError::backend)?;
        let events = read_txn
            .open_table(FEED_EVENTS)
            .map_err(StorageError::backend)?;

        let mut unread = 0u64;
        for entry in events
            .range::<&[u8]>(user_range(&floor, prefix_end.as_deref()))
            .map_err(StorageError::backend)?
        {
            entry.map_err(StorageError::backend)?;
            unread += 1;
        }
        Ok(unread)
    }

    async fn reset_last_read(&self, user: &UserId, at: i64) -> Result<bool, StorageError> {
        self.storage
            .write_meta(&keys::meta_key(user, LAST_READ), at.to_string().as_bytes())?;

        trace!(user = %user, at, "Reset last read");
        Ok(true)
    }

    async fn last_read(&self, user: &UserId) -> Result<i64, StorageError> {
        self.read_meta_field(user, LAST_READ)
    }

    async fn recalculate_count(&self, user: &UserId) -> Result<i64, StorageError> {
        let prefix = keys::user_prefix(user);
        let prefix_end = keys::prefix_end(&prefix);

        let write_txn = self
            .storage
            .db()
            .begin_write()
            .map_err(StorageError::backend)?;

        let (actual, correction) = {
            let events = write_txn
                .open_table(FEED_EVENTS)
                .map_err(StorageError::backend)?;
            let actual = scan_keys(&events, &prefix, prefix_end.as_deref())?.len() as i64;

            let mut meta = write_txn
                .open_table(FEED_META)
                .map_err(StorageError::backend)?;
            let previous = read_field(&meta, user, TOTAL_COUNT)?;
            write_field(&mut meta, user, TOTAL_COUNT, actual)?;

            (actual, actual - previous)
        };

        write_txn.commit().map_err(StorageError::backend)?;

        debug!(user = %user, actual, correction, "Recalculated total count");
        Ok(0)
    }

    async fn meta(&self, user: &UserId) -> Result<FeedMeta, StorageError> {
        let read_txn = self
            .storage
            .db()
            .begin_read()
            .map_err(StorageError::backend)?;
        let meta = read_txn
            .open_table(FEED_META)
            .map_err(StorageError::backend)?;

        Ok(FeedMeta {
            total_count: read_field(&meta, user, TOTAL_COUNT)?,
            unread_count: read_field(&meta, user, UNREAD_COUNT)?,
            last_read: read_field(&meta, user, LAST_READ)?,
        })
    }
}
