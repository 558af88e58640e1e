//! Command-line interface

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use feeder_core::{UserId, unix_now};
use feeder_storage::StorageError;
use serde_json::{Value, json};

use crate::activity::UserActivity;
use crate::config::{ConfigError, FeederConfig};
use crate::feed::Feed;

#[derive(Debug, Parser)]
#[command(name = "feeder", about = "Capacity-bounded per-user activity feeds", version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the database path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied
    pub fn resolve_config(&self) -> Result<FeederConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => FeederConfig::load(path)?,
            None => FeederConfig::default(),
        };

        if let Some(db) = &self.db {
            config.store.db_path = db.clone();
        }
        if let Some(level) = &self.log_level {
            config.log.default_level = level.clone();
            config.debug = false;
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check that the store responds
    Health,
    /// Add an event to a user's feed
    Store {
        user: UserId,
        value: String,
        /// Unix timestamp in seconds (defaults to now)
        #[arg(long, allow_hyphen_values = true)]
        at: Option<i64>,
    },
    /// Remove one event by exact value and timestamp
    Delete {
        user: UserId,
        value: String,
        #[arg(allow_hyphen_values = true)]
        at: i64,
    },
    /// Remove all of a user's events
    Wipe { user: UserId },
    /// List all events, newest first
    All { user: UserId },
    /// Read one page and mark the feed as read
    Page {
        user: UserId,
        #[arg(default_value_t = 1)]
        page: usize,
        /// Page size (defaults to the feed's per_page)
        #[arg(long)]
        per_page: Option<usize>,
    },
    /// Maintained event count
    Count { user: UserId },
    /// Events since the last read
    Unread { user: UserId },
    /// Set the last-read watermark
    MarkRead {
        user: UserId,
        /// Unix timestamp in seconds (defaults to now)
        #[arg(long, allow_hyphen_values = true)]
        at: Option<i64>,
    },
    /// Show the last-read watermark
    LastRead { user: UserId },
    /// Reconcile the count with the stored events
    Recalculate { user: UserId },
    /// Count, unread and watermark in one object
    Summary { user: UserId },
}

impl Command {
    /// The user this command acts on, if any
    pub fn user(&self) -> Option<&UserId> {
        match self {
            Command::Health => None,
            Command::Store { user, .. }
            | Command::Delete { user, .. }
            | Command::Wipe { user }
            | Command::All { user }
            | Command::Page { user, .. }
            | Command::Count { user }
            | Command::Unread { user }
            | Command::MarkRead { user, .. }
            | Command::LastRead { user }
            | Command::Recalculate { user }
            | Command::Summary { user } => Some(user),
        }
    }
}

/// Run one command against `feed` and return its JSON result
pub async fn execute(feed: Arc<Feed>, command: Command) -> Result<Value, StorageError> {
    let activity = |user: UserId| UserActivity::new(user, Arc::clone(&feed));

    let output = match command {
        Command::Health => json!({ "status": feed.health_check().await? }),
        Command::Store { user, value, at } => {
            let at = at.unwrap_or_else(unix_now);
            json!({ "delta": activity(user).store(&value, at).await?, "at": at })
        }
        Command::Delete { user, value, at } => {
            json!({ "removed": activity(user).delete(&value, at).await? })
        }
        Command::Wipe { user } => json!({ "removed": activity(user).wipe().await? }),
        Command::All { user } => json!(activity(user).all().await?),
        Command::Page {
            user,
            page,
            per_page,
        } => {
            let per_page = per_page.unwrap_or(feed.per_page());
            json!(activity(user).paginate(page, per_page).await?)
        }
        Command::Count { user } => json!({ "count": activity(user).count().await? }),
        Command::Unread { user } => json!({ "unread": activity(user).unread_count().await? }),
        Command::MarkRead { user, at } => {
            let at = at.unwrap_or_else(unix_now);
            json!({ "ok": activity(user).reset_last_read(at).await?, "last_read": at })
        }
        Command::LastRead { user } => json!({ "last_read": activity(user).last_read().await? }),
        Command::Recalculate { user } => {
            json!({ "updated": activity(user).recalculate_count().await? })
        }
        Command::Summary { user } => json!(activity(user).summary().await?),
    };

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feeder_storage::InMemoryEventStore;

    fn feed() -> Arc<Feed> {
        Arc::new(Feed::new(
            "notifications",
            3,
            2,
            Arc::new(InMemoryEventStore::new()),
        ))
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("feeder").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_store_with_negative_timestamp() {
        let cli = parse(&["store", "okandas", "hello", "--at", "-5"]);
        match cli.command {
            Command::Store { user, value, at } => {
                assert_eq!(user.as_str(), "okandas");
                assert_eq!(value, "hello");
                assert_eq!(at, Some(-5));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_overrides() {
        let cli = parse(&["count", "okandas", "--db", "/tmp/x.redb", "--log-level", "warn"]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.store.db_path, PathBuf::from("/tmp/x.redb"));
        assert_eq!(config.log_config().default_level, "warn");
        assert_eq!(cli.command.user().map(UserId::as_str), Some("okandas"));
    }

    #[test]
    fn test_page_defaults_to_first() {
        let cli = parse(&["page", "okandas"]);
        assert!(matches!(
            cli.command,
            Command::Page {
                page: 1,
                per_page: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_execute_round() {
        let feed = feed();
        let user = UserId::new("okandas");
        let run = |command| execute(Arc::clone(&feed), command);

        assert_eq!(run(Command::Health).await.unwrap(), json!({ "status": "PONG" }));

        for (value, at) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            run(Command::Store {
                user: user.clone(),
                value: value.to_string(),
                at: Some(at),
            })
            .await
            .unwrap();
        }

        assert_eq!(
            run(Command::All { user: user.clone() }).await.unwrap(),
            json!(["d", "c", "b"])
        );
        assert_eq!(
            run(Command::Count { user: user.clone() }).await.unwrap(),
            json!({ "count": 3 })
        );
        assert_eq!(
            run(Command::Page {
                user: user.clone(),
                page: 2,
                per_page: None
            })
            .await
            .unwrap(),
            json!(["b"])
        );
        assert_eq!(
            run(Command::Unread { user: user.clone() }).await.unwrap(),
            json!({ "unread": 0 })
        );
        assert_eq!(
            run(Command::Recalculate { user: user.clone() }).await.unwrap(),
            json!({ "updated": 0 })
        );

        let summary = run(Command::Summary { user: user.clone() }).await.unwrap();
        assert_eq!(summary["feed"], "notifications");
        assert_eq!(summary["count"], 3);
    }

    #[tokio::test]
    async fn test_execute_invalid_page() {
        let err = execute(
            feed(),
            Command::Page {
                user: UserId::new("okandas"),
                page: 0,
                per_page: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }
}
