//! redb database handle and the two feed tables

use std::path::PathBuf;
use std::sync::Arc;

use redb::{Database, TableDefinition};
use tracing::{debug, info, instrument};

use crate::error::StorageError;

// Key: (user, score, value) concatenated, Value: empty
pub const FEED_EVENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("feed_events");

// Key: (user, field name) concatenated, Value: decimal integer as UTF-8
pub const FEED_META: TableDefinition<&[u8], &[u8]> = TableDefinition::new("feed_meta");

/// Where and how to open the feed database
#[derive(Debug, Clone)]
pub struct RedbStorageConfig {
    /// Database file, created with its parent directories if missing
    pub db_path: PathBuf,
    /// Page cache budget in bytes
    pub cache_size: usize,
}

impl Default for RedbStorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/feeder.redb"),
            cache_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

impl RedbStorageConfig {
    /// Create a configuration for the given database file
    pub fn with_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Default::default()
        }
    }
}

/// Owns the redb database and its tables
pub struct RedbStorage {
    db: Arc<Database>,
    config: RedbStorageConfig,
}

impl RedbStorage {
    /// Open the database file, creating it and both tables on first use
    #[instrument(skip(config), fields(path = %config.db_path.display()))]
    pub fn open(config: RedbStorageConfig) -> Result<Self, StorageError> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::builder()
            .set_cache_size(config.cache_size)
            .create(&config.db_path)
            .map_err(StorageError::backend)?;

        info!("Opened feed database");

        let storage = Self {
            db: Arc::new(db),
            config,
        };

        storage.init_tables()?;

        Ok(storage)
    }

    /// Create tables if they don't exist
    fn init_tables(&self) -> Result<(), StorageError> {
        let write_txn = self.db.begin_write().map_err(StorageError::backend)?;

        write_txn
            .open_table(FEED_EVENTS)
            .map_err(StorageError::backend)?;
        write_txn
            .open_table(FEED_META)
            .map_err(StorageError::backend)?;

        write_txn.commit().map_err(StorageError::backend)?;

        debug!("Feed tables ready");
        Ok(())
    }

    /// The underlying redb handle, for multi-table transactions
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &RedbStorageConfig {
        &self.config
    }

    /// Overwrite one metadata field in its own transaction
    pub fn write_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let write_txn = self.db.begin_write().map_err(StorageError::backend)?;
        {
            let mut meta = write_txn
                .open_table(FEED_META)
                .map_err(StorageError::backend)?;
            meta.insert(key, value).map_err(StorageError::backend)?;
        }
        write_txn.commit().map_err(StorageError::backend)
    }

    /// Raw bytes of one metadata field, if set
    pub fn read_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let read_txn = self.db.begin_read().map_err(StorageError::backend)?;
        let meta = read_txn
            .open_table(FEED_META)
            .map_err(StorageError::backend)?;

        Ok(meta
            .get(key)
            .map_err(StorageError::backend)?
            .map(|raw| raw.value().to_vec()))
    }
}
