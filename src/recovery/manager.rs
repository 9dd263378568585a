//! Recovery Manager
//!
//! Drives a full recovery run against the files named in `Config`.
//!
//! ## Ordering
//! 1. Load the log (cutting torn tails) and the page store
//! 2. Analysis → Redo → Undo, in memory
//! 3. Make the new CLRs durable
//! 4. Only then replace the page store snapshot

use parking_lot::Mutex;
use tracing::info;

use crate::config::{Config, WalFormat};
use crate::error::Result;
use crate::storage::PageStore;
use crate::wal::{jsonl, Log, WalLoader, WalWriter};

use super::{analysis, recover_in_memory, AnalysisOutcome, RecoveryReport};

/// Runs recovery for one log and one page store
///
/// ## Concurrency
/// Recovery of a store must never overlap with itself. `run_lock`
/// serializes every call that reads or writes the files, so a manager can
/// be shared across threads.
pub struct RecoveryManager {
    config: Config,

    /// Serializes recovery runs
    run_lock: Mutex<()>,
}

impl RecoveryManager {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            run_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Recover the store and, if configured, persist the result
    pub fn recover(&self) -> Result<RecoveryReport> {
        let _guard = self.run_lock.lock();
        info!(
            wal = %self.config.wal_path.display(),
            pages = %self.config.page_store_path.display(),
            "starting recovery"
        );

        let mut log = self.load_log()?;
        let mut pages = self.load_pages()?;
        let prior_len = log.len();

        let report = recover_in_memory(&mut log, &mut pages)?;

        if self.config.persist && !report.is_noop() {
            self.persist_log(&log, prior_len)?;
            pages.save(&self.config.page_store_path)?;
        }

        info!(
            redone = report.redone.len(),
            undone = report.undone.len(),
            persisted = self.config.persist,
            "recovery complete"
        );
        Ok(report)
    }

    /// Run Analysis only; no file is modified
    pub fn analyze(&self) -> Result<AnalysisOutcome> {
        let _guard = self.run_lock.lock();
        let log = self.read_log(false)?;
        analysis(log.records())
    }

    /// Read the configured log; a missing file is an empty log.
    /// A torn binary tail is cut off only when the run persists.
    pub fn load_log(&self) -> Result<Log> {
        self.read_log(self.config.persist)
    }

    fn read_log(&self, repair: bool) -> Result<Log> {
        let path = &self.config.wal_path;
        if !path.exists() {
            info!(path = %path.display(), "no WAL found, nothing to recover");
            return Ok(Log::new());
        }
        match self.config.wal_format {
            WalFormat::Binary if repair => Ok(WalLoader::load(path)?.0),
            WalFormat::Binary => Ok(WalLoader::read(path)?.0),
            WalFormat::JsonLines => jsonl::read_log(path),
        }
    }

    /// Read the configured page store; a missing file is an empty store
    pub fn load_pages(&self) -> Result<PageStore> {
        let path = &self.config.page_store_path;
        if !path.exists() {
            info!(path = %path.display(), "no page store found, starting empty");
            return Ok(PageStore::new());
        }
        PageStore::load(path)
    }

    /// Write every record past `prior_len` to the log file and sync it
    fn persist_log(&self, log: &Log, prior_len: usize) -> Result<()> {
        let appended = &log.records()[prior_len..];
        if appended.is_empty() {
            return Ok(());
        }

        match self.config.wal_format {
            WalFormat::Binary => {
                WalWriter::open(&self.config.wal_path, self.config.wal_sync_strategy)?
                    .append_all(appended)?;
            }
            WalFormat::JsonLines => jsonl::write_log(&self.config.wal_path, log)?,
        }

        info!(records = appended.len(), "compensation records made durable");
        Ok(())
    }
}
