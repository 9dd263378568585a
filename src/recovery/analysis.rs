//! Analysis pass
//!
//! Rebuilds the Transaction Table and Dirty Page Table as of the crash from
//! the latest checkpoint forward.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::error::{AriesError, Phase, Result};
use crate::wal::{LogRecord, Lsn, RecordKind, TxId};

use super::{DirtyPageTable, TransactionTable, TxEntry, TxStatus};

/// Everything Analysis learns about the crash
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisOutcome {
    /// Transactions that had not ended at crash time
    pub transactions: TransactionTable,

    pub dirty_pages: DirtyPageTable,

    /// Transactions that wrote an END record, in log order
    pub ended: Vec<TxId>,

    /// LSN of the checkpoint the scan started from, if any
    pub checkpoint_lsn: Option<Lsn>,
}

impl AnalysisOutcome {
    /// Committed transactions plus fully ended ones, sorted
    pub fn winners(&self) -> Vec<TxId> {
        let committed = self
            .transactions
            .iter()
            .filter(|(_, entry)| entry.status == TxStatus::Committed)
            .map(|(tx, _)| tx.clone());
        let ended = self
            .ended
            .iter()
            .filter(|tx| !self.transactions.contains(tx.as_str()))
            .cloned();
        committed.chain(ended).collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// Running and aborted transactions, sorted
    pub fn losers(&self) -> Vec<TxId> {
        self.transactions
            .iter()
            .filter(|(_, entry)| entry.status.is_loser())
            .map(|(tx, _)| tx.clone())
            .collect()
    }
}

/// Scan `log` and reconstruct the recovery tables.
///
/// Fails with `MalformedRecord` when a record refers to a transaction that
/// neither the checkpoint nor an earlier BEGIN in the scanned range knows.
pub fn analysis(log: &[LogRecord]) -> Result<AnalysisOutcome> {
    let mut outcome = AnalysisOutcome::default();

    // Backward scan for the most recent checkpoint
    let start = match log
        .iter()
        .rposition(|record| matches!(record.kind, RecordKind::Checkpoint { .. }))
    {
        Some(pos) => {
            if let RecordKind::Checkpoint { snapshot } = &log[pos].kind {
                outcome.transactions = snapshot.transactions.clone();
                outcome.dirty_pages = snapshot.dirty_pages.clone();
                debug!(
                    lsn = log[pos].lsn,
                    transactions = outcome.transactions.len(),
                    dirty_pages = outcome.dirty_pages.len(),
                    "seeded tables from checkpoint"
                );
            }
            outcome.checkpoint_lsn = Some(log[pos].lsn);
            pos + 1
        }
        None => 0,
    };

    info!(
        from = start,
        records = log.len() - start,
        "analysis: scanning log"
    );

    for record in &log[start..] {
        let lsn = record.lsn;
        match &record.kind {
            RecordKind::Begin { tx } => outcome.transactions.begin(tx.as_str(), lsn),
            RecordKind::Update { tx, page, .. } | RecordKind::Compensation { tx, page, .. } => {
                touch(&mut outcome.transactions, record, tx)?;
                outcome.dirty_pages.mark_dirty(page, lsn);
            }
            RecordKind::Commit { tx } => {
                touch(&mut outcome.transactions, record, tx)?.status = TxStatus::Committed;
            }
            RecordKind::Abort { tx } => {
                touch(&mut outcome.transactions, record, tx)?.status = TxStatus::Aborted;
            }
            RecordKind::End { tx } => {
                if outcome.transactions.remove(tx).is_none() {
                    return Err(unknown_transaction(record, tx));
                }
                outcome.ended.push(tx.clone());
            }
            RecordKind::Checkpoint { .. } => {}
        }
    }

    info!(
        transactions = outcome.transactions.len(),
        dirty_pages = outcome.dirty_pages.len(),
        ended = outcome.ended.len(),
        "analysis: complete"
    );
    Ok(outcome)
}

/// Advance `tx`'s lastLSN to this record
fn touch<'t>(
    tt: &'t mut TransactionTable,
    record: &LogRecord,
    tx: &str,
) -> Result<&'t mut TxEntry> {
    let entry = tt
        .get_mut(tx)
        .ok_or_else(|| unknown_transaction(record, tx))?;
    entry.last_lsn = record.lsn;
    Ok(entry)
}

fn unknown_transaction(record: &LogRecord, tx: &str) -> AriesError {
    AriesError::malformed(
        Phase::Analysis,
        record.lsn,
        record.kind.name(),
        format!("transaction {} has no BEGIN or checkpoint entry", tx),
    )
}
