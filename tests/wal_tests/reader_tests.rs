//! Tests for WAL Reader
//!
//! These tests verify:
//! - Reading records from a WAL file
//! - Iterator functionality
//! - Partial write and corruption handling
//! - Empty file handling

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use aries_recovery::wal::{CheckpointSnapshot, LogRecord, WalReader, HEADER_SIZE};
use aries_recovery::{AriesError, DirtyPageTable, TransactionTable, TxEntry, TxStatus};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn write_raw(path: &PathBuf, records: &[LogRecord]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for record in records {
        bytes.extend_from_slice(&record.serialize().unwrap());
    }
    let mut file = File::create(path).unwrap();
    file.write_all(&bytes).unwrap();
    file.sync_all().unwrap();
    bytes
}

fn sample_records() -> Vec<LogRecord> {
    vec![
        LogRecord::begin(5, "T1"),
        LogRecord::begin(6, "T2"),
        LogRecord::update(10, "T1", "P1", 0, 1),
        LogRecord::update(12, "T2", "P2", 10, 11),
        LogRecord::commit(15, "T1"),
    ]
}

// =============================================================================
// Basic Reading Tests
// =============================================================================

#[test]
fn test_read_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.position(), 0);
    assert_eq!(reader.last_lsn(), None);
}

#[test]
fn test_read_in_append_order() {
    let (_temp, wal_path) = setup_temp_wal();
    let records = sample_records();
    let bytes = write_raw(&wal_path, &records);

    let mut reader = WalReader::open(&wal_path).unwrap();
    for expected in &records {
        assert_eq!(&reader.next_entry().unwrap().unwrap(), expected);
    }
    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.position(), bytes.len() as u64);
    assert_eq!(reader.last_lsn(), Some(15));
}

#[test]
fn test_iterator_yields_all_records() {
    let (_temp, wal_path) = setup_temp_wal();
    write_raw(&wal_path, &sample_records());

    let read: Vec<LogRecord> = WalReader::open(&wal_path)
        .unwrap()
        .entries()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(read, sample_records());
}

#[test]
fn test_checkpoint_record_round_trips_through_file() {
    let (_temp, wal_path) = setup_temp_wal();
    let transactions: TransactionTable = [("T1", TxEntry::new(TxStatus::Running, 10))]
        .into_iter()
        .collect();
    let dirty_pages: DirtyPageTable = [("P1", 10)].into_iter().collect();
    let checkpoint = LogRecord::checkpoint(
        11,
        CheckpointSnapshot {
            transactions,
            dirty_pages,
        },
    );
    write_raw(&wal_path, &[checkpoint.clone()]);

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert_eq!(reader.next_entry().unwrap(), Some(checkpoint));
}

// =============================================================================
// Damage Tests
// =============================================================================

#[test]
fn test_partial_header_is_an_error() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut bytes = write_raw(&wal_path, &sample_records()[..1]);
    bytes.extend_from_slice(&[0u8; HEADER_SIZE - 3]);
    std::fs::write(&wal_path, &bytes).unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert!(reader.next_entry().unwrap().is_some());
    assert!(matches!(reader.next_entry(), Err(AriesError::WalCorruption(_))));
}

#[test]
fn test_iterator_stops_after_corruption() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut bytes = write_raw(&wal_path, &sample_records());
    // Flip a byte inside the second frame's payload
    let first_len = sample_records()[0].serialize().unwrap().len();
    bytes[first_len + HEADER_SIZE] ^= 0xFF;
    std::fs::write(&wal_path, &bytes).unwrap();

    let results: Vec<_> = WalReader::open(&wal_path).unwrap().entries().collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[test]
fn test_out_of_order_lsn_is_rejected() {
    let (_temp, wal_path) = setup_temp_wal();
    write_raw(
        &wal_path,
        &[LogRecord::begin(9, "T1"), LogRecord::begin(3, "T2")],
    );

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert!(reader.next_entry().unwrap().is_some());
    assert!(matches!(
        reader.next_entry(),
        Err(AriesError::NonMonotonicLsn { previous: 9, lsn: 3 })
    ));
    assert_eq!(reader.last_lsn(), Some(9));
}
