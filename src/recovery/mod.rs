//! Recovery Module
//!
//! ARIES restart recovery in three strictly sequential passes:
//!
//! ```text
//!   log ──► Analysis ──► (TT, DPT) ──► Redo ──► Undo ──► CLRs appended
//!                                       │         │
//!                                       └─► page store ◄─┘
//! ```
//!
//! - **Analysis** rebuilds the Transaction Table and Dirty Page Table from
//!   the latest checkpoint forward.
//! - **Redo** repeats history from the smallest recLSN, skipping any update
//!   a page already reflects (pageLSN rule).
//! - **Undo** rolls back loser updates newest first and logs a CLR for each.
//!
//! Each pass either applies all of its effects or none of them.

mod analysis;
mod manager;
mod redo;
mod report;
mod tables;
mod undo;

pub use analysis::{analysis, AnalysisOutcome};
pub use manager::RecoveryManager;
pub use redo::redo;
pub use report::RecoveryReport;
pub use tables::{DirtyPageTable, TransactionTable, TxEntry, TxStatus};
pub use undo::undo;

use crate::error::Result;
use crate::storage::PageStore;
use crate::wal::Log;

/// Run Analysis, Redo and Undo over an in-memory log and page store.
///
/// On success `log` carries the new CLRs and `pages` the recovered images.
/// If a pass fails, the passes before it have already been applied and the
/// failing pass has changed nothing; rerunning recovery is always safe.
pub fn recover_in_memory(log: &mut Log, pages: &mut PageStore) -> Result<RecoveryReport> {
    let analysis = analysis(log.records())?;
    let redone = redo(log, &analysis.dirty_pages, pages)?;

    let prior_len = log.len();
    let undone = undo(log, &analysis.transactions, pages)?;
    let compensations = log.records()[prior_len..].to_vec();

    Ok(RecoveryReport {
        analysis,
        redone,
        undone,
        compensations,
    })
}
