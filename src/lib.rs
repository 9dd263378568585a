//! # ARIES Recovery
//!
//! Crash recovery for a write-ahead logged page store:
//! - Analysis rebuilds the Transaction and Dirty Page tables from the log
//! - Redo repeats history so the store reflects every logged change
//! - Undo rolls back uncommitted work, logging a CLR for each step so an
//!   interrupted rollback is never repeated
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    RecoveryManager                          │
//! │            (Config paths, run lock, persistence)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │ Page Store  │
//!   │ (Log, CLRs) │          │  (Staged)   │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────────────────────────────────┐
//!   │     Analysis  ──►  Redo  ──►  Undo      │
//!   └─────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod recovery;
pub mod storage;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use error::{AriesError, Phase, Result};
pub use recovery::{
    analysis, recover_in_memory, redo, undo, AnalysisOutcome, DirtyPageTable, RecoveryManager,
    RecoveryReport, TransactionTable, TxEntry, TxStatus,
};
pub use storage::{Page, PageStore};
pub use wal::{Log, LogRecord, Lsn, RecordKind};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the recovery engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
