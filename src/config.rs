//! Configuration for a recovery run
//!
//! Centralized configuration with sensible defaults. File locations are
//! always explicit; nothing in the recovery phases looks at paths.

use std::path::{Path, PathBuf};

use crate::error::{AriesError, Result};

/// Main configuration for a recovery run
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Location of the write-ahead log
    pub wal_path: PathBuf,

    /// Location of the page store snapshot (JSON)
    pub page_store_path: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// On-disk encoding of the log at `wal_path`
    pub wal_format: WalFormat,

    /// Sync strategy used when appending compensation records
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Run Configuration
    // -------------------------------------------------------------------------
    /// Write CLRs and the recovered page store back to disk.
    /// When false, recovery is computed and reported only.
    pub persist: bool,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// Encoding of the log file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalFormat {
    /// CRC-framed bincode records
    Binary,

    /// One JSON object per line
    JsonLines,
}

impl Config {
    const DEFAULT_DATA_DIR: &'static str = "./aries_data";
    pub const WAL_FILENAME: &'static str = "wal.log";
    pub const PAGES_FILENAME: &'static str = "pages.json";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the configuration describes a usable run
    pub fn validate(&self) -> Result<()> {
        if self.wal_path == self.page_store_path {
            return Err(AriesError::Config(format!(
                "WAL and page store share the same path: {}",
                self.wal_path.display()
            )));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(AriesError::Config(
                "EveryNEntries sync strategy needs a count of at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = Path::new(Self::DEFAULT_DATA_DIR);
        Self {
            wal_path: data_dir.join(Self::WAL_FILENAME),
            page_store_path: data_dir.join(Self::PAGES_FILENAME),
            wal_format: WalFormat::Binary,
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            persist: true,
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Place both files under `dir` using their default names
    pub fn data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.config.wal_path = dir.join(Config::WAL_FILENAME);
        self.config.page_store_path = dir.join(Config::PAGES_FILENAME);
        self
    }

    /// Set the WAL location
    pub fn wal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wal_path = path.into();
        self
    }

    /// Set the page store location
    pub fn page_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.page_store_path = path.into();
        self
    }

    /// Set the WAL encoding
    pub fn wal_format(mut self, format: WalFormat) -> Self {
        self.config.wal_format = format;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Whether recovery writes its results back to disk
    pub fn persist(mut self, persist: bool) -> Self {
        self.config.persist = persist;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
