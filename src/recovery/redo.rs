//! Redo pass
//!
//! Repeats history from the smallest recLSN so the page store reflects every
//! logged change, winners and losers alike.

use tracing::{debug, info, trace};

use crate::error::{Phase, Result};
use crate::storage::{Page, PageStore};
use crate::wal::{Log, Lsn, RecordKind};

use super::DirtyPageTable;

/// Reapply logged page writes newer than each page's pageLSN.
///
/// Updates install their after image. CLRs left by an interrupted earlier
/// recovery install their before image. Returns the LSNs applied, ascending.
/// Either every write lands in `pages` or, on error, none does.
pub fn redo(log: &Log, dpt: &DirtyPageTable, pages: &mut PageStore) -> Result<Vec<Lsn>> {
    let Some(min_rec_lsn) = dpt.min_rec_lsn() else {
        debug!("redo: dirty page table is empty, nothing to redo");
        return Ok(Vec::new());
    };

    let start = log.position_from(min_rec_lsn);
    info!(min_rec_lsn, records = log.len() - start, "redo: scanning log");

    let mut staged = pages.stage();
    let mut redone = Vec::new();

    for record in &log.records()[start..] {
        let (page_id, value) = match &record.kind {
            RecordKind::Update { page, after, .. } => (page, *after),
            RecordKind::Compensation { page, before, .. } => (page, *before),
            _ => continue,
        };

        let current = staged.read(Phase::Redo, record.lsn, page_id)?;
        if record.lsn <= current.page_lsn {
            trace!(lsn = record.lsn, page = %page_id, page_lsn = current.page_lsn, "already on disk");
            continue;
        }

        staged.write(page_id, Page::new(value, record.lsn));
        redone.push(record.lsn);
        debug!(lsn = record.lsn, page = %page_id, value, "redo: applied");
    }

    let written = staged.commit();
    info!(redone = redone.len(), pages = written, "redo: complete");
    Ok(redone)
}
