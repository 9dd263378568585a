//! JSON-lines log format
//!
//! One record per line, e.g.
//! ```text
//! {"LSN": 5, "type": "BEGIN", "tx": "T1"}
//! {"LSN": 10, "type": "UPDATE", "tx": "T1", "page": "P1", "before": 0, "after": 1}
//! {"LSN": 11, "type": "CHECKPOINT", "tt": {"T1": {"status": "RUNNING", "lastLSN": 10}}, "dpt": {"P1": 10}}
//! {"LSN": 12, "type": "CLR", "tx": "T1", "page": "P1", "before": 0, "undoLSN": 10}
//! ```
//!
//! Every field a kind needs is checked here, so a missing field surfaces as
//! a `MalformedRecord` error naming the record instead of a guessed value.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AriesError, Phase, Result};
use crate::recovery::{DirtyPageTable, TransactionTable};

use super::{CheckpointSnapshot, Log, LogRecord, Lsn, PageId, PageValue, RecordKind, TxId};

/// Wire shape of a record: every optional field present as an Option
#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonRecord {
    #[serde(rename = "LSN")]
    lsn: Lsn,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tx: Option<TxId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page: Option<PageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    before: Option<PageValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    after: Option<PageValue>,
    #[serde(rename = "undoLSN", default, skip_serializing_if = "Option::is_none")]
    undo_lsn: Option<Lsn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tt: Option<TransactionTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dpt: Option<DirtyPageTable>,
}

impl JsonRecord {
    fn require<T>(&self, field: Option<T>, name: &str) -> Result<T> {
        field.ok_or_else(|| {
            AriesError::malformed(
                Phase::Load,
                self.lsn,
                self.kind.as_str(),
                format!("missing `{}`", name),
            )
        })
    }

    fn into_record(self) -> Result<LogRecord> {
        let kind = match self.kind.as_str() {
            "BEGIN" => RecordKind::Begin {
                tx: self.require(self.tx.clone(), "tx")?,
            },
            "UPDATE" => RecordKind::Update {
                tx: self.require(self.tx.clone(), "tx")?,
                page: self.require(self.page.clone(), "page")?,
                before: self.require(self.before, "before")?,
                after: self.require(self.after, "after")?,
            },
            "COMMIT" => RecordKind::Commit {
                tx: self.require(self.tx.clone(), "tx")?,
            },
            "ABORT" => RecordKind::Abort {
                tx: self.require(self.tx.clone(), "tx")?,
            },
            "END" => RecordKind::End {
                tx: self.require(self.tx.clone(), "tx")?,
            },
            "CHECKPOINT" => RecordKind::Checkpoint {
                snapshot: CheckpointSnapshot {
                    transactions: self.require(self.tt.clone(), "tt")?,
                    dirty_pages: self.require(self.dpt.clone(), "dpt")?,
                },
            },
            "CLR" | "COMPENSATION" => RecordKind::Compensation {
                tx: self.require(self.tx.clone(), "tx")?,
                page: self.require(self.page.clone(), "page")?,
                before: self.require(self.before, "before")?,
                undone_lsn: self.require(self.undo_lsn, "undoLSN")?,
            },
            other => {
                return Err(AriesError::malformed(
                    Phase::Load,
                    self.lsn,
                    other,
                    "unknown record type",
                ))
            }
        };
        Ok(LogRecord::new(self.lsn, kind))
    }

    fn from_record(record: &LogRecord) -> Self {
        let mut json = JsonRecord {
            lsn: record.lsn,
            kind: record.kind.name().to_string(),
            ..Default::default()
        };
        match &record.kind {
            RecordKind::Begin { tx }
            | RecordKind::Commit { tx }
            | RecordKind::Abort { tx }
            | RecordKind::End { tx } => json.tx = Some(tx.clone()),
            RecordKind::Update {
                tx,
                page,
                before,
                after,
            } => {
                json.tx = Some(tx.clone());
                json.page = Some(page.clone());
                json.before = Some(*before);
                json.after = Some(*after);
            }
            RecordKind::Checkpoint { snapshot } => {
                json.tt = Some(snapshot.transactions.clone());
                json.dpt = Some(snapshot.dirty_pages.clone());
            }
            RecordKind::Compensation {
                tx,
                page,
                before,
                undone_lsn,
            } => {
                json.tx = Some(tx.clone());
                json.page = Some(page.clone());
                json.before = Some(*before);
                json.undo_lsn = Some(*undone_lsn);
            }
        }
        json
    }
}

/// Parse a single JSON line into a record
pub fn parse_line(line: &str) -> Result<LogRecord> {
    let json: JsonRecord = serde_json::from_str(line)?;
    json.into_record()
}

/// Render a record as a single JSON line (no trailing newline)
pub fn to_line(record: &LogRecord) -> Result<String> {
    Ok(serde_json::to_string(&JsonRecord::from_record(record))?)
}

/// Read a whole JSON-lines log. Blank lines are skipped.
pub fn read_log(path: &Path) -> Result<Log> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_line(&line).map_err(|e| match e {
            AriesError::Serialization(msg) => {
                AriesError::Serialization(format!("line {}: {}", index + 1, msg))
            }
            other => other,
        })?;
        records.push(record);
    }

    Log::from_records(records)
}

/// Write a whole log as JSON lines, replacing `path` atomically
pub fn write_log(path: &Path, log: &Log) -> Result<()> {
    let temp_path = path.with_extension("jsonl.tmp");
    {
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        for record in log {
            writeln!(writer, "{}", to_line(record)?)?;
        }
        let file = writer
            .into_inner()
            .map_err(|e| AriesError::WalWrite(format!("flush {}: {}", temp_path.display(), e)))?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}
