//! Tests for WAL Writer
//!
//! These tests verify:
//! - LSN assignment on append
//! - Appending records that carry their own LSN (CLRs)
//! - Bulk appends that cannot follow the file write nothing
//! - Reopening an existing WAL continues after its last LSN
//! - Sync strategies
//! - Integration with reader

use std::path::PathBuf;

use aries_recovery::config::WalSyncStrategy;
use aries_recovery::wal::{LogRecord, RecordKind, WalReader, WalWriter};
use aries_recovery::AriesError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn begin(tx: &str) -> RecordKind {
    RecordKind::Begin { tx: tx.to_string() }
}

fn read_all(path: &PathBuf) -> Vec<LogRecord> {
    WalReader::open(path)
        .unwrap()
        .entries()
        .map(|r| r.unwrap())
        .collect()
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_append_assigns_sequential_lsns() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    assert_eq!(writer.current_lsn(), 0);
    assert_eq!(writer.append(begin("T1")).unwrap(), 1);
    assert_eq!(writer.append(begin("T2")).unwrap(), 2);
    assert_eq!(writer.append(RecordKind::Commit { tx: "T1".into() }).unwrap(), 3);
    assert_eq!(writer.current_lsn(), 3);
}

#[test]
fn test_append_record_keeps_given_lsn() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append_record(&LogRecord::begin(5, "T1")).unwrap();
        writer
            .append_record(&LogRecord::update(10, "T1", "P1", 0, 1))
            .unwrap();
        writer
            .append_record(&LogRecord::compensation(11, "T1", "P1", 0, 10))
            .unwrap();
    }

    let records = read_all(&wal_path);
    let lsns: Vec<u64> = records.iter().map(|r| r.lsn).collect();
    assert_eq!(lsns, vec![5, 10, 11]);
    assert_eq!(records[2], LogRecord::compensation(11, "T1", "P1", 0, 10));
}

#[test]
fn test_append_record_rejects_stale_lsn() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.append_record(&LogRecord::begin(7, "T1")).unwrap();

    let result = writer.append_record(&LogRecord::begin(7, "T2"));
    assert!(matches!(
        result,
        Err(AriesError::NonMonotonicLsn { previous: 7, lsn: 7 })
    ));
    assert_eq!(read_all(&wal_path).len(), 1);
}

#[test]
fn test_append_all_overlapping_run_writes_nothing() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer
        .append_all(&[
            LogRecord::begin(1, "T1"),
            LogRecord::update(2, "T1", "P1", 0, 1),
            LogRecord::commit(3, "T1"),
        ])
        .unwrap();
    let bytes_before = std::fs::read(&wal_path).unwrap();

    // Starts inside the existing history; LSN 4 alone would have fit
    let result = writer.append_all(&[LogRecord::begin(2, "T2"), LogRecord::begin(4, "T3")]);

    assert!(matches!(
        result,
        Err(AriesError::NonMonotonicLsn { previous: 3, lsn: 2 })
    ));
    assert_eq!(std::fs::read(&wal_path).unwrap(), bytes_before);
    assert_eq!(writer.current_lsn(), 3);
}

// =============================================================================
// Reopen Tests
// =============================================================================

#[test]
fn test_reopen_continues_after_last_lsn() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(begin("T1")).unwrap();
        writer.append(begin("T2")).unwrap();
    }

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.current_lsn(), 2);
    assert_eq!(writer.append(begin("T3")).unwrap(), 3);
    drop(writer);

    assert_eq!(read_all(&wal_path).len(), 3);
}

#[test]
fn test_reopen_cuts_torn_tail_before_appending() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(begin("T1")).unwrap();
    }
    // Simulate a crash in the middle of the next frame
    let partial = LogRecord::begin(2, "T2").serialize().unwrap();
    let mut bytes = std::fs::read(&wal_path).unwrap();
    bytes.extend_from_slice(&partial[..partial.len() / 2]);
    std::fs::write(&wal_path, bytes).unwrap();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.current_lsn(), 1);
    writer.append(begin("T3")).unwrap();
    drop(writer);

    let records = read_all(&wal_path);
    assert_eq!(records, vec![LogRecord::begin(1, "T1"), LogRecord::begin(2, "T3")]);
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_every_n_entries_flushes_on_drop() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer =
            WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 100 }).unwrap();
        for i in 0..10 {
            writer.append(begin(&format!("T{}", i))).unwrap();
        }
    }

    assert_eq!(read_all(&wal_path).len(), 10);
}

#[test]
fn test_explicit_sync_is_idempotent() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 3 }).unwrap();
    writer.append(begin("T1")).unwrap();
    writer.sync().unwrap();
    writer.sync().unwrap();
    assert_eq!(writer.current_lsn(), 1);
}
