//! Undo pass
//!
//! Rolls back every update of a loser transaction, newest first, writing a
//! compensation log record (CLR) for each one.
//!
//! This is a single backward scan over the whole log, not a per-transaction
//! walk along prevLSN chains. Updates already covered by a CLR (from an
//! earlier, interrupted recovery) are skipped, so a rerun never undoes the
//! same update twice.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{Phase, Result};
use crate::storage::{Page, PageStore};
use crate::wal::{Log, LogRecord, Lsn, RecordKind};

use super::TransactionTable;

/// Undo loser updates in `log` against `pages`, appending one CLR per undone
/// update. CLR LSNs continue from the log's maximum LSN. Returns the undone
/// update LSNs in processing (descending) order.
pub fn undo(log: &mut Log, tt: &TransactionTable, pages: &mut PageStore) -> Result<Vec<Lsn>> {
    if tt.is_empty() {
        debug!("undo: transaction table is empty, nothing to undo");
        return Ok(Vec::new());
    }

    let compensated: HashSet<Lsn> = log
        .iter()
        .filter_map(|record| match record.kind {
            RecordKind::Compensation { undone_lsn, .. } => Some(undone_lsn),
            _ => None,
        })
        .collect();

    let mut next_lsn = log.max_lsn() + 1;
    info!(records = log.len(), next_lsn, "undo: scanning log backward");

    let mut staged = pages.stage();
    let mut clrs = Vec::new();
    let mut undone = Vec::new();

    // The scan reads the log as it stood before any CLR was minted
    for record in log.iter().rev() {
        let RecordKind::Update {
            tx, page, before, ..
        } = &record.kind
        else {
            continue;
        };
        if !tt.is_loser(tx) || compensated.contains(&record.lsn) {
            continue;
        }

        staged.read(Phase::Undo, record.lsn, page)?;
        staged.write(page, Page::new(*before, next_lsn));
        clrs.push(LogRecord::compensation(
            next_lsn,
            tx.as_str(),
            page.as_str(),
            *before,
            record.lsn,
        ));
        undone.push(record.lsn);
        debug!(lsn = record.lsn, clr = next_lsn, page = %page, before, "undo: restored");

        next_lsn += 1;
    }

    // CLRs reach the log before the pages they describe
    for clr in clrs {
        log.append(clr)?;
    }
    let written = staged.commit();

    info!(undone = undone.len(), pages = written, "undo: complete");
    Ok(undone)
}
