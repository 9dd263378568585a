//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::config::WalSyncStrategy;
use crate::error::{AriesError, Result};

use super::{LogRecord, Lsn, RecordKind, WalLoader};

/// Writes records to the WAL file
pub struct WalWriter {
    file: File,
    current_lsn: Lsn,
    sync_strategy: WalSyncStrategy,
    /// Records written since the last fsync
    unsynced: usize,
}

impl WalWriter {
    /// Open or create a WAL file.
    ///
    /// An existing file is scanned first; a torn or corrupt tail is cut off
    /// so new frames always follow the last valid one.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let current_lsn = if path.exists() {
            WalLoader::repair(path)?.last_lsn
        } else {
            0
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!(path = %path.display(), current_lsn, "opened WAL for append");

        Ok(Self {
            file,
            current_lsn,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append a record under the next LSN and return that LSN
    pub fn append(&mut self, kind: RecordKind) -> Result<Lsn> {
        let record = LogRecord::new(self.current_lsn + 1, kind);
        self.append_record(&record)?;
        Ok(record.lsn)
    }

    /// Append a record that already carries its LSN, such as a CLR minted
    /// during Undo. The LSN must exceed every LSN in the file.
    pub fn append_record(&mut self, record: &LogRecord) -> Result<()> {
        if record.lsn <= self.current_lsn {
            return Err(AriesError::NonMonotonicLsn {
                previous: self.current_lsn,
                lsn: record.lsn,
            });
        }

        let bytes = record.serialize()?;
        self.file
            .write_all(&bytes)
            .map_err(|e| AriesError::WalWrite(format!("LSN {}: {}", record.lsn, e)))?;
        self.current_lsn = record.lsn;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync()?;
        }
        Ok(())
    }

    /// Append a run of records and sync. LSN order is checked for the whole
    /// run before anything is written, so a run that cannot follow the file
    /// leaves it unchanged.
    pub fn append_all(&mut self, records: &[LogRecord]) -> Result<()> {
        let mut previous = self.current_lsn;
        for record in records {
            if record.lsn <= previous {
                return Err(AriesError::NonMonotonicLsn {
                    previous,
                    lsn: record.lsn,
                });
            }
            previous = record.lsn;
        }
        for record in records {
            self.append_record(record)?;
        }
        self.sync()
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        if self.unsynced == 0 {
            return Ok(());
        }
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// LSN of the last record written, 0 for an empty file
    pub fn current_lsn(&self) -> Lsn {
        self.current_lsn
    }
}

impl Drop for WalWriter {
    fn drop(&mut self) {
        let _ = self.sync();
    }
}
