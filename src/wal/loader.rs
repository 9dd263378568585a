//! WAL Loader
//!
//! Brings a binary WAL file back to a consistent prefix after a crash and
//! hands its records to recovery.

use std::fs::OpenOptions;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{AriesError, Result};

use super::reader::{Frame, WalReader};
use super::{Log, LogRecord, Lsn};

/// Loads and repairs WAL files
pub struct WalLoader;

/// Result of scanning a WAL file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Number of valid records found
    pub records_loaded: u64,

    /// Damaged final frames (0 or 1)
    pub records_corrupted: u64,

    /// Bytes after the last valid frame
    pub bytes_discarded: u64,

    /// LSN of the last valid record, 0 if none
    pub last_lsn: Lsn,

    /// Whether the file was cut back to its valid prefix
    pub was_truncated: bool,
}

impl WalLoader {
    /// Load every valid record from a WAL file.
    ///
    /// This will:
    /// 1. Read frames in order until the end or a damaged final frame
    /// 2. Truncate the file after the last valid frame
    /// 3. Return the valid records in LSN order
    ///
    /// A bad frame with data after it fails with `WalCorruption` and an
    /// out-of-order LSN with `NonMonotonicLsn`; neither touches the file.
    pub fn load(path: &Path) -> Result<(Log, LoadStats)> {
        Self::collect(path, true)
    }

    /// Like `load`, but leaves a damaged tail on disk
    pub fn read(path: &Path) -> Result<(Log, LoadStats)> {
        Self::collect(path, false)
    }

    /// Scan a WAL file and report what `load` would keep, without changing it
    pub fn verify(path: &Path) -> Result<LoadStats> {
        Self::scan(path, false, |_| {})
    }

    /// Cut a WAL file back to its valid prefix without keeping the records
    pub(crate) fn repair(path: &Path) -> Result<LoadStats> {
        Self::scan(path, true, |_| {})
    }

    fn collect(path: &Path, truncate: bool) -> Result<(Log, LoadStats)> {
        let mut records = Vec::new();
        let stats = Self::scan(path, truncate, |record| records.push(record))?;
        info!(
            path = %path.display(),
            records = stats.records_loaded,
            last_lsn = stats.last_lsn,
            "loaded WAL"
        );
        Ok((Log::from_records(records)?, stats))
    }

    fn scan(path: &Path, truncate: bool, mut sink: impl FnMut(LogRecord)) -> Result<LoadStats> {
        let file_len = std::fs::metadata(path)?.len();
        let mut reader = WalReader::open(path)?;
        let mut stats = LoadStats::default();

        loop {
            match reader.read_frame()? {
                Frame::Record(record) => {
                    stats.records_loaded += 1;
                    stats.last_lsn = record.lsn;
                    sink(record);
                }
                Frame::Eof => break,
                Frame::Torn => {
                    warn!(offset = reader.position(), "partial record at end of WAL");
                    break;
                }
                // Only the final frame may be damaged by a crash mid-write.
                // Anything after a bad frame means history is missing.
                Frame::Corrupt {
                    reason,
                    frame_end: Some(end),
                } if end == file_len => {
                    warn!(offset = reader.position(), %reason, "corrupt final WAL record");
                    stats.records_corrupted += 1;
                    break;
                }
                Frame::Corrupt { reason, .. } => {
                    return Err(AriesError::WalCorruption(format!(
                        "{}: offset {}: {} (followed by further data)",
                        path.display(),
                        reader.position(),
                        reason
                    )));
                }
            }
        }

        let valid_len = reader.position();
        stats.bytes_discarded = file_len - valid_len;

        if truncate && stats.bytes_discarded > 0 {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len)?;
            file.sync_all()?;
            stats.was_truncated = true;
            warn!(
                path = %path.display(),
                discarded = stats.bytes_discarded,
                "truncated WAL to last valid record"
            );
        }

        Ok(stats)
    }
}
