//! Human-readable recovery reports

use std::fmt;

use crate::wal::{LogRecord, Lsn};

use super::{AnalysisOutcome, TxStatus};

/// What a recovery run found and did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    pub analysis: AnalysisOutcome,

    /// LSNs reapplied by Redo, ascending
    pub redone: Vec<Lsn>,

    /// Update LSNs rolled back by Undo, in processing order
    pub undone: Vec<Lsn>,

    /// CLRs appended by Undo
    pub compensations: Vec<LogRecord>,
}

impl RecoveryReport {
    /// True if recovery changed neither the log nor the page store
    pub fn is_noop(&self) -> bool {
        self.redone.is_empty() && self.undone.is_empty()
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxStatus::Running => "RUNNING",
            TxStatus::Committed => "COMMITTED",
            TxStatus::Aborted => "ABORTED",
        };
        f.pad(name)
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "-".to_string();
    }
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for AnalysisOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Analysis ==")?;
        match self.checkpoint_lsn {
            Some(lsn) => writeln!(f, "checkpoint:  LSN {}", lsn)?,
            None => writeln!(f, "checkpoint:  none")?,
        }
        writeln!(f, "winners:     {}", join(&self.winners()))?;
        writeln!(f, "losers:      {}", join(&self.losers()))?;
        writeln!(f, "ended:       {}", join(&self.ended))?;

        writeln!(f, "transaction table:")?;
        if self.transactions.is_empty() {
            writeln!(f, "  (empty)")?;
        }
        for (tx, entry) in &self.transactions {
            writeln!(f, "  {:<8} {:<10} lastLSN={}", tx, entry.status, entry.last_lsn)?;
        }

        writeln!(f, "dirty page table:")?;
        if self.dirty_pages.is_empty() {
            writeln!(f, "  (empty)")?;
        }
        for (page, rec_lsn) in &self.dirty_pages {
            writeln!(f, "  {:<8} recLSN={}", page, rec_lsn)?;
        }
        Ok(())
    }
}

impl fmt::Display for RecoveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.analysis)?;
        writeln!(f, "== Redo ==")?;
        writeln!(f, "redone LSNs: {}", join(&self.redone))?;
        writeln!(f, "== Undo ==")?;
        writeln!(f, "undone LSNs: {}", join(&self.undone))?;
        writeln!(f, "CLRs written: {}", self.compensations.len())
    }
}
