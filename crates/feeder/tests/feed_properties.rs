//! Feed behavior checked against both store backends

use std::sync::Arc;

use feeder::{Feed, OrderedEventStore, UserActivity, UserId, unix_now};
use feeder_storage::{InMemoryEventStore, RedbEventStore, RedbStorageConfig};
use tempfile::TempDir;

const MINUTE: i64 = 60;

/// A store plus whatever keeps it alive
struct Backend {
    store: Arc<dyn OrderedEventStore>,
    _temp: Option<TempDir>,
}

fn backends() -> Vec<(&'static str, Backend)> {
    let temp_dir = TempDir::new().unwrap();
    let redb = RedbEventStore::open(RedbStorageConfig::with_path(
        temp_dir.path().join("feeder.redb"),
    ))
    .unwrap();

    vec![
        (
            "memory",
            Backend {
                store: Arc::new(InMemoryEventStore::new()),
                _temp: None,
            },
        ),
        (
            "redb",
            Backend {
                store: Arc::new(redb),
                _temp: Some(temp_dir),
            },
        ),
    ]
}

fn activity(backend: &Backend, max_size: usize, per_page: usize) -> UserActivity {
    let feed = Feed::new("notifications", max_size, per_page, Arc::clone(&backend.store));
    UserActivity::new("okandas", Arc::new(feed))
}

#[tokio::test]
async fn capacity_bound_keeps_newest() {
    for (name, backend) in backends() {
        let activity = activity(&backend, 17, 10);
        for at in 1..=40 {
            activity.store(&format!("event {at}"), at).await.unwrap();
        }

        assert_eq!(activity.count().await.unwrap(), 17, "{name}");
        let expected: Vec<String> = (24..=40).rev().map(|at| format!("event {at}")).collect();
        assert_eq!(activity.all().await.unwrap(), expected, "{name}");
    }
}

#[tokio::test]
async fn store_delta_reports_net_change() {
    for (name, backend) in backends() {
        let activity = activity(&backend, 2, 10);

        assert_eq!(activity.store("a", 1).await.unwrap(), 1, "{name}");
        assert_eq!(activity.store("b", 2).await.unwrap(), 1, "{name}");
        assert_eq!(activity.store("c", 3).await.unwrap(), 0, "{name}");
        // Older than everything kept: added then evicted at once
        assert_eq!(activity.store("z", 0).await.unwrap(), 0, "{name}");
        assert_eq!(activity.all().await.unwrap(), vec!["c", "b"], "{name}");
    }
}

#[tokio::test]
async fn pagination_windows() {
    for (name, backend) in backends() {
        let activity = activity(&backend, 10, 15);
        for at in 1..=7 {
            activity.store(&format!("e{at}"), at).await.unwrap();
        }

        assert_eq!(
            activity.paginate(1, 5).await.unwrap(),
            vec!["e7", "e6", "e5", "e4", "e3"],
            "{name}"
        );
        assert_eq!(activity.paginate(2, 5).await.unwrap(), vec!["e2", "e1"], "{name}");
        assert!(activity.paginate(3, 5).await.unwrap().is_empty(), "{name}");
    }
}

#[tokio::test]
async fn unread_counts_against_watermark() {
    for (name, backend) in backends() {
        let activity = activity(&backend, 10, 15);
        let watermark = unix_now();

        activity.reset_last_read(watermark).await.unwrap();
        activity.store("before", watermark - 3 * MINUTE).await.unwrap();
        activity.store("at", watermark).await.unwrap();
        activity.store("after 1", watermark + 1).await.unwrap();
        activity.store("after 2", watermark + 2).await.unwrap();

        assert_eq!(activity.unread_count().await.unwrap(), 3, "{name}");
    }
}

#[tokio::test]
async fn reading_a_page_marks_earlier_events_read() {
    for (name, backend) in backends() {
        let activity = activity(&backend, 10, 15);
        let earlier = unix_now() - MINUTE;
        for i in 0..4 {
            activity.store(&format!("e{i}"), earlier + i).await.unwrap();
        }
        assert_eq!(activity.unread_count().await.unwrap(), 4, "{name}");

        activity.page(1).await.unwrap();
        assert_eq!(activity.unread_count().await.unwrap(), 0, "{name}");
    }
}

#[tokio::test]
async fn wipe_then_recalculate() {
    for (name, backend) in backends() {
        let activity = activity(&backend, 10, 15);
        assert_eq!(activity.wipe().await.unwrap(), 0, "{name}");

        for at in 1..=3 {
            activity.store(&format!("e{at}"), at).await.unwrap();
        }
        assert_eq!(activity.wipe().await.unwrap(), 1, "{name}");
        assert!(activity.all().await.unwrap().is_empty(), "{name}");

        // The counter only catches up on reconciliation
        assert_eq!(activity.count().await.unwrap(), 3, "{name}");
        assert_eq!(activity.recalculate_count().await.unwrap(), 0, "{name}");
        assert_eq!(activity.count().await.unwrap(), 0, "{name}");
    }
}

#[tokio::test]
async fn duplicate_events_are_suppressed() {
    for (name, backend) in backends() {
        let activity = activity(&backend, 10, 15);

        assert_eq!(activity.store("same", 5).await.unwrap(), 1, "{name}");
        assert_eq!(activity.store("same", 5).await.unwrap(), 0, "{name}");
        assert_eq!(activity.count().await.unwrap(), 1, "{name}");
    }
}

#[tokio::test]
async fn users_do_not_share_feeds() {
    for (name, backend) in backends() {
        let feed = Arc::new(Feed::new("notifications", 10, 15, Arc::clone(&backend.store)));
        let alice = UserActivity::new("alice", Arc::clone(&feed));
        let alicex = UserActivity::new("alicex", Arc::clone(&feed));

        alice.store("hello", 1).await.unwrap();
        alicex.store("other", 2).await.unwrap();
        alicex.reset_last_read(100).await.unwrap();

        assert_eq!(alice.all().await.unwrap(), vec!["hello"], "{name}");
        assert_eq!(alice.last_read().await.unwrap(), 0, "{name}");
        assert_eq!(alicex.count().await.unwrap(), 1, "{name}");
        assert_eq!(feed.count(&UserId::new("nobody")).await.unwrap(), 0, "{name}");
    }
}

#[tokio::test]
async fn redb_feed_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("feeder.redb");

    {
        let store = RedbEventStore::open(RedbStorageConfig::with_path(&path)).unwrap();
        let activity = UserActivity::new(
            "okandas",
            Arc::new(Feed::new("notifications", 10, 15, Arc::new(store))),
        );
        activity.store("kept", 7).await.unwrap();
        activity.reset_last_read(5).await.unwrap();
    }

    let store = RedbEventStore::open(RedbStorageConfig::with_path(&path)).unwrap();
    let activity = UserActivity::new(
        "okandas",
        Arc::new(Feed::new("notifications", 10, 15, Arc::new(store))),
    );
    let summary = activity.summary().await.unwrap();
    assert_eq!(summary.count, 1);
    assert_eq!(summary.unread, 1);
    assert_eq!(summary.last_read, 5);
    assert_eq!(activity.all().await.unwrap(), vec!["kept"]);
}
