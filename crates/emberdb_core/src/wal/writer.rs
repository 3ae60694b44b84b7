//! Buffered, append-only WAL writer.

use crate::error::{EngineError, EngineResult};
use crate::wal::record::WalRecord;
use emberdb_storage::{FileBackend, StorageBackend};
use std::io;
use std::path::Path;
use tracing::{debug, error, warn};

/// Append-only writer that frames records and buffers them in memory.
///
/// Records accumulate in a fixed-capacity buffer holding exact on-disk
/// bytes. [`WalWriter::flush`] moves the buffer to the operating system;
/// only [`WalWriter::sync`] forces the bytes to durable media. The two
/// must not be conflated: an acknowledged record is durable only after a
/// successful sync.
///
/// An open failure leaves the writer alive but disabled: every subsequent
/// append fails with an I/O error, and nothing panics. This mirrors the
/// engine contract that a missing WAL disables durability rather than
/// taking the process down.
pub struct WalWriter {
    backend: Option<Box<dyn StorageBackend>>,
    buffer: Vec<u8>,
    capacity: usize,
}

impl WalWriter {
    /// Opens a writer appending to the file at `path`.
    ///
    /// Never fails: if the file cannot be opened the error is logged and
    /// the writer starts disabled.
    #[must_use]
    pub fn open(path: &Path, capacity: usize) -> Self {
        match FileBackend::open_with_create_dirs(path) {
            Ok(backend) => {
                debug!(path = %path.display(), "WAL opened");
                Self::new(Box::new(backend), capacity)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to open WAL file");
                Self {
                    backend: None,
                    buffer: Vec::new(),
                    capacity,
                }
            }
        }
    }

    /// Creates a writer over an arbitrary backend.
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>, capacity: usize) -> Self {
        Self {
            backend: Some(backend),
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns `true` if the underlying file opened successfully.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    /// Appends a PUT record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for oversized key/value, or an I/O error
    /// if the writer is disabled or a triggered flush fails.
    pub fn write_put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.append_record(&WalRecord::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    /// Appends an UPDATE record.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::write_put`].
    pub fn write_update(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.append_record(&WalRecord::Update {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    /// Appends a DELETE record.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::write_put`].
    pub fn write_delete(&mut self, key: &[u8]) -> EngineResult<()> {
        self.append_record(&WalRecord::Delete { key: key.to_vec() })
    }

    /// Appends a CHECKPOINT marker record.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the writer is disabled or a flush fails.
    pub fn write_checkpoint(&mut self) -> EngineResult<()> {
        self.append_record(&WalRecord::Checkpoint)
    }

    fn append_record(&mut self, record: &WalRecord) -> EngineResult<()> {
        if self.backend.is_none() {
            return Err(Self::not_open());
        }

        let bytes = record.encode()?;

        // Flush first when the record would not fit. A record larger than
        // the buffer is appended whole after the flush and delivered by
        // the next drain.
        if self.buffer.len() + bytes.len() > self.capacity {
            self.flush()?;
        }
        self.buffer.extend_from_slice(&bytes);
        Ok(())
    }

    /// Drains the buffer to the file.
    ///
    /// Short writes are retried until the buffer is fully delivered;
    /// transient interrupt errors retry transparently (both handled by
    /// the backend's write loop). This moves bytes to the OS only - see
    /// [`Self::sync`] for durability.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the underlying write.
    pub fn flush(&mut self) -> EngineResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let backend = self.backend.as_mut().ok_or_else(Self::not_open)?;
        backend.append(&self.buffer)?;
        backend.flush()?;
        self.buffer.clear();
        Ok(())
    }

    /// Flushes, then forces the file to durable storage.
    ///
    /// Only this call establishes the durability contract.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the writer is disabled or the flush or
    /// sync fails.
    pub fn sync(&mut self) -> EngineResult<()> {
        self.flush()?;
        let backend = self.backend.as_mut().ok_or_else(Self::not_open)?;
        backend.sync()?;
        Ok(())
    }

    /// Discards buffered records and truncates the log to zero length.
    ///
    /// Used after a checkpoint has been durably published: everything the
    /// log contained is covered by the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the writer is disabled or truncation fails.
    pub fn truncate_and_reset(&mut self) -> EngineResult<()> {
        self.buffer.clear();
        let backend = self.backend.as_mut().ok_or_else(Self::not_open)?;
        backend.truncate(0)?;
        Ok(())
    }

    /// Number of buffered bytes not yet handed to the OS.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn not_open() -> EngineError {
        EngineError::Io(io::Error::new(io::ErrorKind::NotConnected, "WAL file not open"))
    }
}

impl Drop for WalWriter {
    fn drop(&mut self) {
        if self.backend.is_some() {
            if let Err(e) = self.sync() {
                warn!(error = %e, "best-effort WAL sync on drop failed");
            }
        }
    }
}

impl std::fmt::Debug for WalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalWriter")
            .field("open", &self.is_open())
            .field("buffered", &self.buffer.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
