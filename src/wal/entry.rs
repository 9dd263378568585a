//! WAL record definitions
//!
//! Defines the structure of individual log records and their framed binary
//! encoding.

use serde::{Deserialize, Serialize};

use crate::error::{AriesError, Result};
use crate::recovery::{DirtyPageTable, TransactionTable};

/// Log Sequence Number - strictly increasing in append order
pub type Lsn = u64;

/// Transaction identifier
pub type TxId = String;

/// Page identifier
pub type PageId = String;

/// Opaque page payload
pub type PageValue = i64;

/// Frame header: LSN (8) + CRC (4) + payload length (4)
pub const HEADER_SIZE: usize = 16;

/// Largest payload a single frame may claim (16 MB)
pub const MAX_RECORD_SIZE: u32 = 16 * 1024 * 1024;

/// A single record in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Position of the record in the total order of history
    pub lsn: Lsn,

    /// What happened
    pub kind: RecordKind,
}

/// Everything that can be logged. Each variant carries exactly the fields
/// its kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    Begin {
        tx: TxId,
    },

    /// A page write with both images
    Update {
        tx: TxId,
        page: PageId,
        before: PageValue,
        after: PageValue,
    },

    Commit {
        tx: TxId,
    },

    Abort {
        tx: TxId,
    },

    /// The transaction is fully wound down
    End {
        tx: TxId,
    },

    Checkpoint {
        snapshot: CheckpointSnapshot,
    },

    /// Compensation log record: the durable intent of restoring `before`
    /// on `page` while rolling back the update at `undone_lsn`
    Compensation {
        tx: TxId,
        page: PageId,
        before: PageValue,
        undone_lsn: Lsn,
    },
}

/// Transaction and dirty page tables as they stood at a checkpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointSnapshot {
    pub transactions: TransactionTable,
    pub dirty_pages: DirtyPageTable,
}

impl RecordKind {
    /// Upper-case kind name, as written in JSON-lines logs
    pub fn name(&self) -> &'static str {
        match self {
            RecordKind::Begin { .. } => "BEGIN",
            RecordKind::Update { .. } => "UPDATE",
            RecordKind::Commit { .. } => "COMMIT",
            RecordKind::Abort { .. } => "ABORT",
            RecordKind::End { .. } => "END",
            RecordKind::Checkpoint { .. } => "CHECKPOINT",
            RecordKind::Compensation { .. } => "CLR",
        }
    }
}

impl LogRecord {
    pub fn new(lsn: Lsn, kind: RecordKind) -> Self {
        Self { lsn, kind }
    }

    pub fn begin(lsn: Lsn, tx: impl Into<TxId>) -> Self {
        Self::new(lsn, RecordKind::Begin { tx: tx.into() })
    }

    pub fn update(
        lsn: Lsn,
        tx: impl Into<TxId>,
        page: impl Into<PageId>,
        before: PageValue,
        after: PageValue,
    ) -> Self {
        Self::new(
            lsn,
            RecordKind::Update {
                tx: tx.into(),
                page: page.into(),
                before,
                after,
            },
        )
    }

    pub fn commit(lsn: Lsn, tx: impl Into<TxId>) -> Self {
        Self::new(lsn, RecordKind::Commit { tx: tx.into() })
    }

    pub fn abort(lsn: Lsn, tx: impl Into<TxId>) -> Self {
        Self::new(lsn, RecordKind::Abort { tx: tx.into() })
    }

    pub fn end(lsn: Lsn, tx: impl Into<TxId>) -> Self {
        Self::new(lsn, RecordKind::End { tx: tx.into() })
    }

    pub fn checkpoint(lsn: Lsn, snapshot: CheckpointSnapshot) -> Self {
        Self::new(lsn, RecordKind::Checkpoint { snapshot })
    }

    pub fn compensation(
        lsn: Lsn,
        tx: impl Into<TxId>,
        page: impl Into<PageId>,
        before: PageValue,
        undone_lsn: Lsn,
    ) -> Self {
        Self::new(
            lsn,
            RecordKind::Compensation {
                tx: tx.into(),
                page: page.into(),
                before,
                undone_lsn,
            },
        )
    }

    // =========================================================================
    // Binary Framing
    // =========================================================================

    /// Encode as `[LSN (8)][CRC (4)][Len (4)][bincode payload]`, little endian
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(&self.kind)?;
        if payload.len() > MAX_RECORD_SIZE as usize {
            return Err(AriesError::WalWrite(format!(
                "record at LSN {} is {} bytes (max {})",
                self.lsn,
                payload.len(),
                MAX_RECORD_SIZE
            )));
        }

        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Decode one frame. `bytes` must hold at least the whole frame; any
    /// trailing bytes are ignored.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::parse(bytes)?;
        let end = HEADER_SIZE + header.len as usize;
        if bytes.len() < end {
            return Err(AriesError::WalCorruption(format!(
                "truncated record at LSN {}: expected {} payload bytes, got {}",
                header.lsn,
                header.len,
                bytes.len() - HEADER_SIZE
            )));
        }
        header.decode(&bytes[HEADER_SIZE..end])
    }
}

/// Parsed frame header
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub lsn: Lsn,
    pub crc: u32,
    pub len: u32,
}

impl FrameHeader {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(AriesError::WalCorruption(format!(
                "incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&bytes[0..8]);
        crc.copy_from_slice(&bytes[8..12]);
        len.copy_from_slice(&bytes[12..16]);

        let header = Self {
            lsn: u64::from_le_bytes(lsn),
            crc: u32::from_le_bytes(crc),
            len: u32::from_le_bytes(len),
        };

        if header.len > MAX_RECORD_SIZE {
            return Err(AriesError::WalCorruption(format!(
                "record at LSN {} claims {} bytes (max {})",
                header.lsn, header.len, MAX_RECORD_SIZE
            )));
        }
        Ok(header)
    }

    pub(crate) fn frame_len(&self) -> usize {
        HEADER_SIZE + self.len as usize
    }

    /// Verify the checksum and decode the payload that follows this header
    pub(crate) fn decode(&self, payload: &[u8]) -> Result<LogRecord> {
        let actual = crc32fast::hash(payload);
        if actual != self.crc {
            return Err(AriesError::WalCorruption(format!(
                "CRC mismatch at LSN {}: stored {:08x}, computed {:08x}",
                self.lsn, self.crc, actual
            )));
        }

        let kind: RecordKind = bincode::deserialize(payload).map_err(|e| {
            AriesError::WalCorruption(format!("undecodable record at LSN {}: {}", self.lsn, e))
        })?;
        Ok(LogRecord::new(self.lsn, kind))
    }
}
