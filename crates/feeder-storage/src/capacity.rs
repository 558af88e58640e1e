//! Capacity bounds and page windows
//!
//! [`CapacityPolicy`] decides which events leave a feed once it grows past
//! its bound. [`PageWindow`] turns a 1-based page request into a rank range.
//! Both validate their inputs so backends never see a nonsensical window.

use std::collections::BTreeSet;

use feeder_core::EventRecord;

use crate::error::StorageError;

/// Bound on the number of events a single user's feed may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPolicy {
    max_size: usize,
}

impl CapacityPolicy {
    /// Create a policy; `max_size` must be at least 1
    pub fn new(max_size: usize) -> Result<Self, StorageError> {
        if max_size == 0 {
            return Err(StorageError::validation("max_size must be >= 1"));
        }
        Ok(Self { max_size })
    }

    /// Get the maximum feed size
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// How many events must go for a feed of `current_len` to fit
    pub fn events_to_evict(&self, current_len: usize) -> usize {
        current_len.saturating_sub(self.max_size)
    }

    /// Pick the `count` oldest records (lowest timestamp first)
    pub fn select_for_eviction(
        &self,
        events: &BTreeSet<EventRecord>,
        count: usize,
    ) -> Vec<EventRecord> {
        // BTreeSet is ordered by (at, value), so the oldest come first
        events.iter().take(count).cloned().collect()
    }
}

/// Rank window for one page of a newest-first listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Rank of the first element on the page (0 = newest)
    pub start: usize,
    /// Maximum number of elements on the page
    pub len: usize,
}

impl PageWindow {
    /// Build the window `[(page-1)*per_page, page*per_page - 1]`
    pub fn new(page: usize, per_page: usize) -> Result<Self, StorageError> {
        if page == 0 {
            return Err(StorageError::validation("page must be >= 1"));
        }
        if per_page == 0 {
            return Err(StorageError::validation("per_page must be >= 1"));
        }
        let start = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| StorageError::validation("page window overflows"))?;
        Ok(Self {
            start,
            len: per_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            CapacityPolicy::new(0),
            Err(StorageError::Validation(_))
        ));
    }

    #[test]
    fn test_events_to_evict() {
        let policy = CapacityPolicy::new(10).unwrap();

        assert_eq!(policy.events_to_evict(9), 0);
        assert_eq!(policy.events_to_evict(10), 0);
        assert_eq!(policy.events_to_evict(11), 1);
        assert_eq!(policy.events_to_evict(15), 5);
    }

    #[test]
    fn test_select_for_eviction_takes_oldest() {
        let policy = CapacityPolicy::new(3).unwrap();

        let mut events = BTreeSet::new();
        events.insert(EventRecord::new("c", 30));
        events.insert(EventRecord::new("a", 10));
        events.insert(EventRecord::new("d", 40));
        events.insert(EventRecord::new("b", 20));

        let to_evict = policy.select_for_eviction(&events, 2);
        assert_eq!(
            to_evict,
            vec![EventRecord::new("a", 10), EventRecord::new("b", 20)]
        );
    }

    #[test]
    fn test_select_for_eviction_more_than_available() {
        let policy = CapacityPolicy::new(1).unwrap();

        let mut events = BTreeSet::new();
        events.insert(EventRecord::new("only", 1));

        assert_eq!(policy.select_for_eviction(&events, 10).len(), 1);
        assert!(policy.select_for_eviction(&BTreeSet::new(), 3).is_empty());
    }

    #[test]
    fn test_page_window() {
        let first = PageWindow::new(1, 5).unwrap();
        assert_eq!((first.start, first.len), (0, 5));

        let second = PageWindow::new(2, 5).unwrap();
        assert_eq!((second.start, second.len), (5, 5));
    }

    #[test]
    fn test_page_window_rejects_zero() {
        assert!(matches!(
            PageWindow::new(0, 5),
            Err(StorageError::Validation(_))
        ));
        assert!(matches!(
            PageWindow::new(1, 0),
            Err(StorageError::Validation(_))
        ));
    }
}
