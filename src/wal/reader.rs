//! WAL Reader
//!
//! Streams records from a binary WAL file one frame at a time, so a log
//! never has to be resident in memory to be scanned.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{AriesError, Result};

use super::entry::FrameHeader;
use super::{LogRecord, Lsn, HEADER_SIZE};

/// Outcome of reading one frame
#[derive(Debug)]
pub(crate) enum Frame {
    Record(LogRecord),
    /// Clean end of file on a frame boundary
    Eof,
    /// The file ends in the middle of a frame (partial write)
    Torn,
    /// A frame failed validation. `frame_end` is the offset just past the
    /// bad frame when its header could be trusted for the length.
    Corrupt {
        reason: String,
        frame_end: Option<u64>,
    },
}

/// Reads entries from the WAL file
pub struct WalReader {
    file: BufReader<File>,
    /// Offset just past the last valid frame
    position: u64,
    last_lsn: Option<Lsn>,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            file: BufReader::new(file),
            position: 0,
            last_lsn: None,
        })
    }

    /// Read the next record. Returns `Ok(None)` at a clean end of file,
    /// `WalCorruption` for a torn or invalid frame and `NonMonotonicLsn` when
    /// a frame's LSN does not exceed its predecessor's.
    pub fn next_entry(&mut self) -> Result<Option<LogRecord>> {
        match self.read_frame()? {
            Frame::Record(record) => Ok(Some(record)),
            Frame::Eof => Ok(None),
            Frame::Torn => Err(AriesError::WalCorruption(format!(
                "partial record at offset {}",
                self.position
            ))),
            Frame::Corrupt { reason, .. } => Err(AriesError::WalCorruption(format!(
                "offset {}: {}",
                self.position, reason
            ))),
        }
    }

    /// Iterate over all records, stopping after the first error
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Byte offset just past the last valid frame
    pub fn position(&self) -> u64 {
        self.position
    }

    /// LSN of the last valid frame read so far
    pub fn last_lsn(&self) -> Option<Lsn> {
        self.last_lsn
    }

    pub(crate) fn read_frame(&mut self) -> Result<Frame> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        match read_full(&mut self.file, &mut header_bytes)? {
            0 => return Ok(Frame::Eof),
            n if n < HEADER_SIZE => return Ok(Frame::Torn),
            _ => {}
        }

        let header = match FrameHeader::parse(&header_bytes) {
            Ok(header) => header,
            Err(e) => {
                return Ok(Frame::Corrupt {
                    reason: e.to_string(),
                    frame_end: None,
                })
            }
        };

        let mut payload = vec![0u8; header.len as usize];
        if read_full(&mut self.file, &mut payload)? < payload.len() {
            return Ok(Frame::Torn);
        }

        let record = match header.decode(&payload) {
            Ok(record) => record,
            Err(e) => {
                return Ok(Frame::Corrupt {
                    reason: e.to_string(),
                    frame_end: Some(self.position + header.frame_len() as u64),
                })
            }
        };

        // A well-formed frame out of LSN order is a malformed log, not damage
        if let Some(previous) = self.last_lsn {
            if record.lsn <= previous {
                return Err(AriesError::NonMonotonicLsn {
                    previous,
                    lsn: record.lsn,
                });
            }
        }

        self.position += header.frame_len() as u64;
        self.last_lsn = Some(record.lsn);
        Ok(Frame::Record(record))
    }
}

/// Fill `buf` as far as the stream allows; returns the number of bytes read
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Iterator over WAL entries
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
