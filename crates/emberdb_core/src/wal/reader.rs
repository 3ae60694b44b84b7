//! Streaming WAL record reader with strict corruption detection.
//!
//! The reader decodes records one at a time from the storage backend,
//! refilling a fixed-size chunk buffer as needed, so memory stays
//! constant regardless of log size.
//!
//! ## Decode policy
//!
//! Every deviation from the framing contract is **fatal**:
//!
//! - Unknown record type → `Corruption`
//! - Key or value length above the configured maximum → `Corruption`
//! - Stored CRC differing from the recomputed CRC → `ChecksumMismatch`
//! - End of log in the middle of a record → `Corruption`
//!
//! The last rule is what detects torn tail writes: a crash mid-append
//! leaves a partial record, and recovery must report it rather than
//! silently truncate the log. Only an end of log that falls exactly on a
//! record boundary is a clean EOF.

use crate::checksum::crc32;
use crate::error::{EngineError, EngineResult};
use crate::types::{MAX_KEY_SIZE, MAX_VALUE_SIZE};
use crate::wal::record::{WalRecord, WalRecordType};
use emberdb_storage::{FileBackend, StorageBackend};
use std::path::Path;

/// Chunk size for refilling the read buffer.
const READ_CHUNK_SIZE: usize = 8192;

/// A streaming decoder over WAL records.
///
/// Also usable as an `Iterator` yielding `EngineResult<WalRecord>`; the
/// iterator fuses after the first error.
pub struct WalReader {
    backend: Box<dyn StorageBackend>,
    /// Total log size, fixed at open.
    total_size: u64,
    /// Offset of the next unread byte in the backend.
    offset: u64,
    buffer: Vec<u8>,
    pos: usize,
    finished: bool,
}

impl WalReader {
    /// Creates a reader over an arbitrary backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend size cannot be determined.
    pub fn new(backend: Box<dyn StorageBackend>) -> EngineResult<Self> {
        let total_size = backend.size()?;
        Ok(Self {
            backend,
            total_size,
            offset: 0,
            buffer: Vec::new(),
            pos: 0,
            finished: false,
        })
    }

    /// Opens a reader over the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened.
    pub fn open(path: &Path) -> EngineResult<Self> {
        let backend = FileBackend::open(path)?;
        Self::new(Box::new(backend))
    }

    /// Decodes the next record.
    ///
    /// Returns `Ok(Some(record))` for a valid record, `Ok(None)` at a
    /// clean end of log, or an error per the module's decode policy.
    ///
    /// # Errors
    ///
    /// `Corruption` / `ChecksumMismatch` on any framing violation;
    /// I/O or storage errors from the underlying reads.
    pub fn read_next(&mut self) -> EngineResult<Option<WalRecord>> {
        if self.finished || !self.has_remaining() {
            self.finished = true;
            return Ok(None);
        }

        // Raw frame bytes, re-accumulated for the CRC check.
        let mut frame = Vec::with_capacity(64);

        let type_byte = self.read_exact(1)?[0];
        frame.push(type_byte);

        let record_type = WalRecordType::from_byte(type_byte).ok_or_else(|| {
            EngineError::corruption(format!("invalid WAL record type: {type_byte}"))
        })?;

        let key_len_bytes = self.read_exact(4)?;
        frame.extend_from_slice(&key_len_bytes);
        let key_len = u32::from_le_bytes([
            key_len_bytes[0],
            key_len_bytes[1],
            key_len_bytes[2],
            key_len_bytes[3],
        ]) as usize;
        if key_len > MAX_KEY_SIZE {
            return Err(EngineError::corruption(format!(
                "key length {key_len} exceeds maximum of {MAX_KEY_SIZE}"
            )));
        }

        let key = self.read_exact(key_len)?;
        frame.extend_from_slice(&key);

        let value_len_bytes = self.read_exact(4)?;
        frame.extend_from_slice(&value_len_bytes);
        let value_len = u32::from_le_bytes([
            value_len_bytes[0],
            value_len_bytes[1],
            value_len_bytes[2],
            value_len_bytes[3],
        ]) as usize;
        if value_len > MAX_VALUE_SIZE {
            return Err(EngineError::corruption(format!(
                "value length {value_len} exceeds maximum of {MAX_VALUE_SIZE}"
            )));
        }

        let value = self.read_exact(value_len)?;
        frame.extend_from_slice(&value);

        let crc_bytes = self.read_exact(4)?;
        let stored_crc =
            u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);

        let computed_crc = crc32(&frame);
        if stored_crc != computed_crc {
            return Err(EngineError::ChecksumMismatch {
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        Ok(Some(WalRecord::from_parts(record_type, key, value)))
    }

    /// Returns `true` if unread bytes remain.
    #[must_use]
    pub fn has_remaining(&self) -> bool {
        self.pos < self.buffer.len() || self.offset < self.total_size
    }

    /// Reads exactly `n` bytes, refilling the chunk buffer as needed.
    ///
    /// Running out of log here means a record was torn mid-write.
    fn read_exact(&mut self, n: usize) -> EngineResult<Vec<u8>> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            if self.pos >= self.buffer.len() {
                if self.offset >= self.total_size {
                    return Err(EngineError::corruption("partial record at end of log"));
                }
                self.refill()?;
            }
            let available = self.buffer.len() - self.pos;
            let take = available.min(n - out.len());
            out.extend_from_slice(&self.buffer[self.pos..self.pos + take]);
            self.pos += take;
        }
        Ok(out)
    }

    fn refill(&mut self) -> EngineResult<()> {
        let remaining = (self.total_size - self.offset) as usize;
        let want = remaining.min(READ_CHUNK_SIZE);
        self.buffer = self.backend.read_at(self.offset, want)?;
        self.offset += self.buffer.len() as u64;
        self.pos = 0;
        Ok(())
    }
}

impl Iterator for WalReader {
    type Item = EngineResult<WalRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl std::fmt::Debug for WalReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalReader")
            .field("total_size", &self.total_size)
            .field("offset", &self.offset)
            .finish()
    }
}
