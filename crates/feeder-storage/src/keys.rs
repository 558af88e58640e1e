//! Byte-key layout for the redb tables
//!
//! Every key starts with a length-prefixed user id, so one user's keys form
//! a contiguous range that no other user's keys can fall into.
//!
//! ```text
//! events: [u32 BE user len][user bytes][score: 8 bytes][value bytes]
//! meta:   [u32 BE user len][user bytes][field name bytes]
//! ```
//!
//! Scores are stored with the sign bit flipped so that big-endian byte order
//! matches signed integer order.

use feeder_core::{EventRecord, UserId};

use crate::error::StorageError;

const SCORE_LEN: usize = 8;
const SIGN_BIT: u64 = 1 << 63;

/// Prefix shared by every key belonging to `user`
pub fn user_prefix(user: &UserId) -> Vec<u8> {
    let bytes = user.as_bytes();
    let mut prefix = Vec::with_capacity(4 + bytes.len());
    prefix.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    prefix.extend_from_slice(bytes);
    prefix
}

/// Encode a timestamp so byte order equals numeric order
pub fn encode_score(at: i64) -> [u8; SCORE_LEN] {
    ((at as u64) ^ SIGN_BIT).to_be_bytes()
}

/// Inverse of [`encode_score`]
pub fn decode_score(bytes: [u8; SCORE_LEN]) -> i64 {
    (u64::from_be_bytes(bytes) ^ SIGN_BIT) as i64
}

/// Key of a single event
pub fn event_key(user: &UserId, value: &str, at: i64) -> Vec<u8> {
    let mut key = score_floor(user, at);
    key.extend_from_slice(value.as_bytes());
    key
}

/// Lowest possible event key for `user` with score `at`
pub fn score_floor(user: &UserId, at: i64) -> Vec<u8> {
    let mut key = user_prefix(user);
    key.extend_from_slice(&encode_score(at));
    key
}

/// Decode an event key back into its record
pub fn decode_event_key(prefix_len: usize, key: &[u8]) -> Result<EventRecord, StorageError> {
    let rest = key
        .get(prefix_len..)
        .ok_or_else(|| StorageError::parse("event key shorter than user prefix"))?;
    if rest.len() < SCORE_LEN {
        return Err(StorageError::parse("event key missing score"));
    }

    let (score, value) = rest.split_at(SCORE_LEN);
    let mut score_bytes = [0u8; SCORE_LEN];
    score_bytes.copy_from_slice(score);

    let value = std::str::from_utf8(value)
        .map_err(|e| StorageError::parse(format!("event value is not UTF-8: {e}")))?;

    Ok(EventRecord::new(value, decode_score(score_bytes)))
}

/// Key of a metadata field
pub fn meta_key(user: &UserId, field: &str) -> Vec<u8> {
    let mut key = user_prefix(user);
    key.extend_from_slice(field.as_bytes());
    key
}

/// Smallest key strictly greater than every key starting with `prefix`
///
/// Returns `None` when no such key exists (the prefix is all `0xFF`).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}
