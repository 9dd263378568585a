//! Staged page writes
//!
//! Redo and Undo write through a `StagedPages` overlay. Reads see the
//! overlay first, then the store. Nothing reaches the store until
//! `commit()`; dropping the overlay discards every buffered write.

use std::collections::BTreeMap;

use crate::error::{AriesError, Phase, Result};
use crate::wal::{Lsn, PageId};

use super::{Page, PageStore};

/// Copy-on-write view over a page store
pub struct StagedPages<'a> {
    store: &'a mut PageStore,
    writes: BTreeMap<PageId, Page>,
}

impl<'a> StagedPages<'a> {
    pub(super) fn new(store: &'a mut PageStore) -> Self {
        Self {
            store,
            writes: BTreeMap::new(),
        }
    }

    /// Current image of `page_id`. A page unknown to the store is fatal for
    /// the phase, so the error names the phase and the record being applied.
    pub fn read(&self, phase: Phase, lsn: Lsn, page_id: &str) -> Result<Page> {
        self.writes
            .get(page_id)
            .or_else(|| self.store.get(page_id))
            .copied()
            .ok_or_else(|| AriesError::MissingPage {
                phase,
                lsn,
                page: page_id.to_string(),
            })
    }

    /// Buffer a new image for `page_id`
    pub fn write(&mut self, page_id: &str, page: Page) {
        self.writes.insert(page_id.to_string(), page);
    }

    /// Apply every buffered write to the store; returns the number of pages
    /// written
    pub fn commit(self) -> usize {
        let count = self.writes.len();
        for (page_id, page) in self.writes {
            self.store.put(page_id, page);
        }
        count
    }
}
