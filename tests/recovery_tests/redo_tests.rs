//! Tests for the Redo pass
//!
//! These tests verify:
//! - Winners and losers are both redone
//! - The pageLSN rule (already-durable updates are skipped)
//! - Idempotence across repeated runs
//! - Missing pages fail without partial effects

use aries_recovery::{redo, AriesError, DirtyPageTable, Log, LogRecord, Page, PageStore, Phase};

// =============================================================================
// Helper Functions
// =============================================================================

fn fresh_pages(ids: &[&str]) -> PageStore {
    ids.iter().map(|id| (*id, Page::new(0, 0))).collect()
}

// =============================================================================
// Apply Tests
// =============================================================================

#[test]
fn test_redo_all_losers() {
    let log = Log::from_records(vec![
        LogRecord::begin(5, "T1"),
        LogRecord::begin(6, "T2"),
        LogRecord::update(10, "T1", "P1", 0, 1),
        LogRecord::update(12, "T2", "P2", 10, 11),
    ])
    .unwrap();
    let dpt: DirtyPageTable = [("P1", 10), ("P2", 12)].into_iter().collect();
    let mut pages = fresh_pages(&["P1", "P2"]);

    let redone = redo(&log, &dpt, &mut pages).unwrap();

    assert_eq!(redone, vec![10, 12]);
    assert_eq!(pages.get("P1"), Some(&Page::new(1, 10)));
    assert_eq!(pages.get("P2"), Some(&Page::new(11, 12)));
}

#[test]
fn test_mixed_winner_loser_redo() {
    let log = Log::from_records(vec![
        LogRecord::begin(5, "T1"),
        LogRecord::begin(6, "T2"),
        LogRecord::update(10, "T1", "P1", 0, 100),
        LogRecord::update(20, "T2", "P2", 0, 200),
        LogRecord::commit(30, "T1"),
    ])
    .unwrap();
    let dpt: DirtyPageTable = [("P1", 10), ("P2", 20)].into_iter().collect();
    let mut pages = fresh_pages(&["P1", "P2"]);

    let redone = redo(&log, &dpt, &mut pages).unwrap();

    assert_eq!(redone, vec![10, 20]);
    assert_eq!(pages.get("P1"), Some(&Page::new(100, 10)));
    assert_eq!(pages.get("P2"), Some(&Page::new(200, 20)));
}

#[test]
fn test_page_lsn_ends_at_highest_applied_update() {
    let log = Log::from_records(vec![
        LogRecord::begin(1, "T1"),
        LogRecord::update(2, "T1", "P1", 0, 1),
        LogRecord::update(3, "T1", "P2", 0, 1),
        LogRecord::update(4, "T1", "P1", 1, 2),
        LogRecord::update(5, "T1", "P1", 2, 3),
    ])
    .unwrap();
    let dpt: DirtyPageTable = [("P1", 2), ("P2", 3)].into_iter().collect();
    let mut pages = fresh_pages(&["P1", "P2"]);
    // P1 already holds LSN 4 on disk
    pages.insert("P1", Page::new(2, 4));

    let redone = redo(&log, &dpt, &mut pages).unwrap();

    assert_eq!(redone, vec![3, 5]);
    assert_eq!(pages.get("P1"), Some(&Page::new(3, 5)));
    assert_eq!(pages.get("P2"), Some(&Page::new(1, 3)));
}

#[test]
fn test_non_update_records_do_not_mutate() {
    let log = Log::from_records(vec![
        LogRecord::begin(1, "T1"),
        LogRecord::commit(2, "T1"),
        LogRecord::end(3, "T1"),
    ])
    .unwrap();
    let dpt: DirtyPageTable = [("P1", 1)].into_iter().collect();
    let mut pages = fresh_pages(&["P1"]);

    assert!(redo(&log, &dpt, &mut pages).unwrap().is_empty());
    assert_eq!(pages, fresh_pages(&["P1"]));
}

// =============================================================================
// Idempotence Tests
// =============================================================================

#[test]
fn test_second_redo_is_noop() {
    let log = Log::from_records(vec![
        LogRecord::begin(5, "T1"),
        LogRecord::update(10, "T1", "P1", 0, 1),
        LogRecord::update(15, "T1", "P2", 0, 2),
    ])
    .unwrap();
    let dpt: DirtyPageTable = [("P1", 10), ("P2", 15)].into_iter().collect();
    let mut pages = fresh_pages(&["P1", "P2"]);

    redo(&log, &dpt, &mut pages).unwrap();
    let after_first = pages.clone();
    let second = redo(&log, &dpt, &mut pages).unwrap();

    assert!(second.is_empty());
    assert_eq!(pages, after_first);
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_missing_page_is_fatal() {
    let log = Log::from_records(vec![
        LogRecord::begin(5, "T1"),
        LogRecord::update(10, "T1", "P1", 0, 1),
        LogRecord::update(12, "T1", "P2", 0, 2),
    ])
    .unwrap();
    let dpt: DirtyPageTable = [("P1", 10), ("P2", 12)].into_iter().collect();
    let mut pages = fresh_pages(&["P1"]);

    let err = redo(&log, &dpt, &mut pages).unwrap_err();

    assert!(matches!(
        err,
        AriesError::MissingPage { phase: Phase::Redo, lsn: 12, ref page } if page == "P2"
    ));
    // P1's update was staged but never applied
    assert_eq!(pages.get("P1"), Some(&Page::new(0, 0)));
}
