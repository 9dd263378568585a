//! Error types for ARIES recovery
//!
//! Provides a unified error type for all operations.

use std::fmt;

use thiserror::Error;

use crate::wal::Lsn;

/// Result type alias using AriesError
pub type Result<T> = std::result::Result<T, AriesError>;

/// The stage of a recovery run that detected a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Parsing a log or page store handed over by a loader
    Load,
    Analysis,
    Redo,
    Undo,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Load => "load",
            Phase::Analysis => "analysis",
            Phase::Redo => "redo",
            Phase::Undo => "undo",
        };
        f.write_str(name)
    }
}

/// Unified error type for recovery operations
#[derive(Debug, Error)]
pub enum AriesError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    #[error("LSN {lsn} does not follow LSN {previous}")]
    NonMonotonicLsn { previous: Lsn, lsn: Lsn },

    // -------------------------------------------------------------------------
    // Recovery Errors
    // -------------------------------------------------------------------------
    /// A record lacks a field its kind requires, or references a
    /// transaction the visible log cannot account for.
    #[error("{phase}: malformed {kind} record at LSN {lsn}: {reason}")]
    MalformedRecord {
        phase: Phase,
        lsn: Lsn,
        kind: String,
        reason: String,
    },

    #[error("{phase}: record at LSN {lsn} touches page {page} which is not in the page store")]
    MissingPage { phase: Phase, lsn: Lsn, page: String },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AriesError {
    pub(crate) fn malformed(
        phase: Phase,
        lsn: Lsn,
        kind: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AriesError::MalformedRecord {
            phase,
            lsn,
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

impl From<bincode::Error> for AriesError {
    fn from(e: bincode::Error) -> Self {
        AriesError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for AriesError {
    fn from(e: serde_json::Error) -> Self {
        AriesError::Serialization(e.to_string())
    }
}
