//! Feeder configuration
//!
//! Loaded from TOML; every field has a default so a partial file (or no
//! file at all) is valid.
//!
//! ```toml
//! debug = false
//!
//! [store]
//! engine = "redb"
//! db_path = "./data/feeder.redb"
//!
//! [feed]
//! name = "notifications"
//! max_size = 17
//! per_page = 10
//!
//! [log]
//! default_level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use feeder_logging::LogConfig;
use feeder_storage::{
    InMemoryEventStore, OrderedEventStore, RedbEventStore, RedbStorageConfig, StorageError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::feed::Feed;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederConfig {
    /// Force debug-level logging
    pub debug: bool,
    pub store: StoreConfig,
    pub feed: FeedConfig,
    pub log: LogConfig,
}

impl FeederConfig {
    /// Read and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate TOML
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.feed.validate()
    }

    /// Logging config with the `debug` switch applied
    pub fn log_config(&self) -> LogConfig {
        let mut log = self.log.clone();
        if self.debug {
            log.default_level = "debug".to_string();
        }
        log
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    pub fn with_feed(mut self, feed: FeedConfig) -> Self {
        self.feed = feed;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Which store backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreEngine {
    /// Persistent redb database
    #[default]
    Redb,
    /// Process-local, lost on exit
    Memory,
}

/// Store backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub engine: StoreEngine,
    /// Path to the redb file
    pub db_path: PathBuf,
    /// redb cache size in bytes
    pub cache_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let redb = RedbStorageConfig::default();
        Self {
            engine: StoreEngine::default(),
            db_path: redb.db_path,
            cache_size: redb.cache_size,
        }
    }
}

impl StoreConfig {
    pub fn with_engine(mut self, engine: StoreEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    /// Open the configured backend
    pub fn open(&self) -> Result<Arc<dyn OrderedEventStore>, StorageError> {
        match self.engine {
            StoreEngine::Redb => {
                let store = RedbEventStore::open(RedbStorageConfig {
                    db_path: self.db_path.clone(),
                    cache_size: self.cache_size,
                })?;
                Ok(Arc::new(store))
            }
            StoreEngine::Memory => {
                info!("Using in-memory store");
                Ok(Arc::new(InMemoryEventStore::new()))
            }
        }
    }
}

/// Feed policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub name: String,
    /// Events kept per user
    pub max_size: usize,
    /// Default page size
    pub per_page: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            name: "notifications".to_string(),
            max_size: 17,
            per_page: 10,
        }
    }
}

impl FeedConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("feed name must not be empty".into()));
        }
        if self.max_size == 0 {
            return Err(ConfigError::Invalid("feed max_size must be at least 1".into()));
        }
        if self.per_page == 0 {
            return Err(ConfigError::Invalid("feed per_page must be at least 1".into()));
        }
        Ok(())
    }

    /// Build a feed over `store` with this policy
    pub fn build(&self, store: Arc<dyn OrderedEventStore>) -> Feed {
        Feed::new(self.name.clone(), self.max_size, self.per_page, store)
    }
}
