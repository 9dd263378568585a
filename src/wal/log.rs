//! In-memory log
//!
//! An append-only, LSN-ordered sequence of records. Analysis and Redo read
//! it forward, Undo reads it backward and appends compensation records.

use std::slice;

use crate::error::{AriesError, Result};

use super::{LogRecord, Lsn};

/// Append-only sequence of log records in strictly increasing LSN order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    records: Vec<LogRecord>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from records already in append order
    pub fn from_records(records: Vec<LogRecord>) -> Result<Self> {
        for pair in records.windows(2) {
            if pair[1].lsn <= pair[0].lsn {
                return Err(AriesError::NonMonotonicLsn {
                    previous: pair[0].lsn,
                    lsn: pair[1].lsn,
                });
            }
        }
        Ok(Self { records })
    }

    /// Append a record; its LSN must exceed every LSN already in the log
    pub fn append(&mut self, record: LogRecord) -> Result<()> {
        if let Some(last) = self.records.last() {
            if record.lsn <= last.lsn {
                return Err(AriesError::NonMonotonicLsn {
                    previous: last.lsn,
                    lsn: record.lsn,
                });
            }
        }
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Records in LSN order; call `.rev()` for a backward scan
    pub fn iter(&self) -> slice::Iter<'_, LogRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest LSN in the log, 0 when empty
    pub fn max_lsn(&self) -> Lsn {
        self.records.last().map(|r| r.lsn).unwrap_or(0)
    }

    /// Index of the first record whose LSN is at least `lsn`
    pub fn position_from(&self, lsn: Lsn) -> usize {
        self.records.partition_point(|r| r.lsn < lsn)
    }
}

impl<'a> IntoIterator for &'a Log {
    type Item = &'a LogRecord;
    type IntoIter = slice::Iter<'a, LogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
