//! Write-Ahead Log (WAL) Module
//!
//! The record schema recovery consumes, plus the collaborators that move
//! records between disk and memory.
//!
//! ## Responsibilities
//! - One closed record type per log kind
//! - In-memory append-only `Log` with strictly increasing LSNs
//! - CRC32-framed binary files: streaming reader, appending writer, loader
//!   that cuts torn tails
//! - JSON-lines import/export
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Record 1                                │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Record 2                                │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```

mod entry;
mod loader;
mod log;
mod reader;
mod writer;

pub mod jsonl;

pub use entry::{
    CheckpointSnapshot, LogRecord, Lsn, PageId, PageValue, RecordKind, TxId, HEADER_SIZE,
    MAX_RECORD_SIZE,
};
pub use loader::{LoadStats, WalLoader};
pub use log::Log;
pub use reader::{WalIterator, WalReader};
pub use writer::WalWriter;
