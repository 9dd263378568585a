//! Transaction Table and Dirty Page Table
//!
//! Both tables are rebuilt from the log on every run and thrown away once
//! Undo finishes. Ordered maps keep reports and checkpoint encodings stable.

use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};

use crate::wal::{Lsn, PageId, TxId};

// =============================================================================
// Transaction Table
// =============================================================================

/// Status of a transaction at crash time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxStatus {
    Running,
    Committed,
    Aborted,
}

impl TxStatus {
    /// Running and aborted transactions are rolled back by Undo
    pub fn is_loser(self) -> bool {
        !matches!(self, TxStatus::Committed)
    }
}

/// Bookkeeping for one live transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxEntry {
    pub status: TxStatus,

    /// LSN of the most recent record written by the transaction
    #[serde(rename = "lastLSN")]
    pub last_lsn: Lsn,
}

impl TxEntry {
    pub fn new(status: TxStatus, last_lsn: Lsn) -> Self {
        Self { status, last_lsn }
    }
}

/// Transactions that had not ended at crash time, keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionTable {
    entries: BTreeMap<TxId, TxEntry>,
}

impl TransactionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `tx` as running. A fresh begin replaces any entry
    /// carried over from a checkpoint.
    pub fn begin(&mut self, tx: impl Into<TxId>, lsn: Lsn) {
        self.entries
            .insert(tx.into(), TxEntry::new(TxStatus::Running, lsn));
    }

    pub fn insert(&mut self, tx: impl Into<TxId>, entry: TxEntry) {
        self.entries.insert(tx.into(), entry);
    }

    pub fn get(&self, tx: &str) -> Option<&TxEntry> {
        self.entries.get(tx)
    }

    pub(crate) fn get_mut(&mut self, tx: &str) -> Option<&mut TxEntry> {
        self.entries.get_mut(tx)
    }

    /// Status of `tx`, or `None` if it is not tracked (never seen or ended)
    pub fn status(&self, tx: &str) -> Option<TxStatus> {
        self.entries.get(tx).map(|entry| entry.status)
    }

    /// True if `tx` is tracked and was not committed
    pub fn is_loser(&self, tx: &str) -> bool {
        self.status(tx).is_some_and(TxStatus::is_loser)
    }

    pub fn remove(&mut self, tx: &str) -> Option<TxEntry> {
        self.entries.remove(tx)
    }

    pub fn contains(&self, tx: &str) -> bool {
        self.entries.contains_key(tx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in transaction id order
    pub fn iter(&self) -> btree_map::Iter<'_, TxId, TxEntry> {
        self.entries.iter()
    }
}

impl<T: Into<TxId>> FromIterator<(T, TxEntry)> for TransactionTable {
    fn from_iter<I: IntoIterator<Item = (T, TxEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(tx, e)| (tx.into(), e)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TransactionTable {
    type Item = (&'a TxId, &'a TxEntry);
    type IntoIter = btree_map::Iter<'a, TxId, TxEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// =============================================================================
// Dirty Page Table
// =============================================================================

/// Pages whose latest logged changes may not be on disk, with the LSN of
/// the earliest such change (`recLSN`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirtyPageTable {
    entries: BTreeMap<PageId, Lsn>,
}

impl DirtyPageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `page` was changed at `lsn`. Only the first sighting sets
    /// the recLSN; returns true if the page was newly added.
    pub fn mark_dirty(&mut self, page: &str, lsn: Lsn) -> bool {
        if self.entries.contains_key(page) {
            return false;
        }
        self.entries.insert(page.to_string(), lsn);
        true
    }

    pub fn insert(&mut self, page: impl Into<PageId>, rec_lsn: Lsn) {
        self.entries.insert(page.into(), rec_lsn);
    }

    pub fn rec_lsn(&self, page: &str) -> Option<Lsn> {
        self.entries.get(page).copied()
    }

    /// Where Redo has to start reading, `None` if nothing is dirty
    pub fn min_rec_lsn(&self) -> Option<Lsn> {
        self.entries.values().copied().min()
    }

    pub fn contains(&self, page: &str) -> bool {
        self.entries.contains_key(page)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in page id order
    pub fn iter(&self) -> btree_map::Iter<'_, PageId, Lsn> {
        self.entries.iter()
    }
}

impl<P: Into<PageId>> FromIterator<(P, Lsn)> for DirtyPageTable {
    fn from_iter<I: IntoIterator<Item = (P, Lsn)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(p, lsn)| (p.into(), lsn)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DirtyPageTable {
    type Item = (&'a PageId, &'a Lsn);
    type IntoIter = btree_map::Iter<'a, PageId, Lsn>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
