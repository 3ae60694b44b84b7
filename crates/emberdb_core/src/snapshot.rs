//! Atomic whole-tree snapshots.
//!
//! A snapshot is a self-describing serialization of the entire key-value
//! mapping at a point in time. It records *content*, never node shape:
//! loading one replays its entries through the normal insert path.
//!
//! ## File layout (little-endian)
//!
//! ```text
//! magic:u32 | version:u32 | entry_count:u32 | header_crc:u32
//! entry[0..entry_count-1]
//! ```
//!
//! Each entry: `key_len:u32 | key | value_len:u32 | value | entry_crc:u32`.
//! The header CRC covers the 12 bytes of magic+version+entry_count; each
//! entry CRC covers the 8 framing bytes plus both payloads in write order.
//!
//! ## Atomic publish
//!
//! Snapshots are written to `<path>.tmp`, synced, and renamed over the
//! final path, so readers observe either the old snapshot or the new one,
//! never a partial file. On Unix the parent directory is fsynced after
//! the rename to make the publish itself durable.

use crate::checksum::crc32;
use crate::error::{EngineError, EngineResult};
use crate::tree::BTree;
use crate::types::{Key, Value, MAX_KEY_SIZE, MAX_VALUE_SIZE};
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Magic number identifying a snapshot file.
pub const SNAPSHOT_MAGIC: u32 = 0x454D_4252;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Writes and inspects snapshot files at a fixed path.
#[derive(Debug)]
pub struct Snapshotter {
    path: PathBuf,
}

impl Snapshotter {
    /// Creates a snapshotter publishing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if a snapshot file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Serializes the whole tree and atomically publishes it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if any write, sync, or the final rename
    /// fails. The temp file is removed best-effort on failure.
    pub fn create(&self, tree: &BTree) -> EngineResult<()> {
        let temp_path = {
            let mut os = self.path.clone().into_os_string();
            os.push(".tmp");
            PathBuf::from(os)
        };

        if let Err(e) = self.write_snapshot(&temp_path, tree) {
            if let Err(unlink_err) = fs::remove_file(&temp_path) {
                debug!(error = %unlink_err, "could not remove snapshot temp file");
            }
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            if let Err(unlink_err) = fs::remove_file(&temp_path) {
                debug!(error = %unlink_err, "could not remove snapshot temp file");
            }
            return Err(e.into());
        }

        if let Err(e) = sync_parent_dir(&self.path) {
            warn!(error = %e, "could not sync snapshot directory");
        }

        info!(path = %self.path.display(), entries = tree.len(), "snapshot published");
        Ok(())
    }

    fn write_snapshot(&self, temp_path: &Path, tree: &BTree) -> EngineResult<()> {
        let mut file = File::create(temp_path)?;

        let mut header = [0u8; 12];
        header[0..4].copy_from_slice(&SNAPSHOT_MAGIC.to_le_bytes());
        header[4..8].copy_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        header[8..12].copy_from_slice(&(tree.len() as u32).to_le_bytes());
        file.write_all(&header)?;
        file.write_all(&crc32(&header).to_le_bytes())?;

        let mut result: std::io::Result<()> = Ok(());
        tree.iterate_all(|key, value| {
            if result.is_err() {
                return;
            }
            let mut entry = Vec::with_capacity(8 + key.len() + value.len());
            entry.extend_from_slice(&(key.len() as u32).to_le_bytes());
            entry.extend_from_slice(key);
            entry.extend_from_slice(&(value.len() as u32).to_le_bytes());
            entry.extend_from_slice(value);
            let entry_crc = crc32(&entry);

            result = file
                .write_all(&entry)
                .and_then(|()| file.write_all(&entry_crc.to_le_bytes()));
        });
        result?;

        file.sync_all()?;
        Ok(())
    }
}

/// Streaming, validating reader over a snapshot file.
#[derive(Debug)]
pub struct SnapshotReader {
    reader: BufReader<File>,
    entry_count: u32,
    entries_read: u32,
}

impl SnapshotReader {
    /// Opens a snapshot and validates its header.
    ///
    /// # Errors
    ///
    /// `Corruption` on a bad magic, unsupported version, or truncated
    /// header; `ChecksumMismatch` if the header CRC disagrees; I/O
    /// errors from the underlying open.
    pub fn open(path: &Path) -> EngineResult<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut header = [0u8; 12];
        read_exact(&mut reader, &mut header)?;

        let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        if magic != SNAPSHOT_MAGIC {
            return Err(EngineError::corruption(format!(
                "invalid snapshot magic: {magic:#010x}"
            )));
        }

        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if version != SNAPSHOT_VERSION {
            return Err(EngineError::corruption(format!(
                "unsupported snapshot version: {version}"
            )));
        }

        let entry_count = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);

        let mut crc_bytes = [0u8; 4];
        read_exact(&mut reader, &mut crc_bytes)?;
        let stored_crc = u32::from_le_bytes(crc_bytes);
        let computed_crc = crc32(&header);
        if stored_crc != computed_crc {
            return Err(EngineError::ChecksumMismatch {
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        Ok(Self {
            reader,
            entry_count,
            entries_read: 0,
        })
    }

    /// Number of entries the header promises.
    #[must_use]
    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    /// Reads and validates the next entry.
    ///
    /// Returns `Ok(None)` once all promised entries have been read.
    ///
    /// # Errors
    ///
    /// `Corruption` on oversized lengths or a short file;
    /// `ChecksumMismatch` if an entry CRC disagrees.
    pub fn read_entry(&mut self) -> EngineResult<Option<(Key, Value)>> {
        if self.entries_read >= self.entry_count {
            return Ok(None);
        }

        let mut frame = Vec::with_capacity(64);

        let mut len_bytes = [0u8; 4];
        read_exact(&mut self.reader, &mut len_bytes)?;
        frame.extend_from_slice(&len_bytes);
        let key_len = u32::from_le_bytes(len_bytes) as usize;
        if key_len > MAX_KEY_SIZE {
            return Err(EngineError::corruption(format!(
                "snapshot key length {key_len} exceeds maximum of {MAX_KEY_SIZE}"
            )));
        }

        let mut key = vec![0u8; key_len];
        read_exact(&mut self.reader, &mut key)?;
        frame.extend_from_slice(&key);

        read_exact(&mut self.reader, &mut len_bytes)?;
        frame.extend_from_slice(&len_bytes);
        let value_len = u32::from_le_bytes(len_bytes) as usize;
        if value_len > MAX_VALUE_SIZE {
            return Err(EngineError::corruption(format!(
                "snapshot value length {value_len} exceeds maximum of {MAX_VALUE_SIZE}"
            )));
        }

        let mut value = vec![0u8; value_len];
        read_exact(&mut self.reader, &mut value)?;
        frame.extend_from_slice(&value);

        let mut crc_bytes = [0u8; 4];
        read_exact(&mut self.reader, &mut crc_bytes)?;
        let stored_crc = u32::from_le_bytes(crc_bytes);
        let computed_crc = crc32(&frame);
        if stored_crc != computed_crc {
            return Err(EngineError::ChecksumMismatch {
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        self.entries_read += 1;
        Ok(Some((key, value)))
    }
}

/// Reads exactly `buf.len()` bytes, mapping a short file to corruption:
/// a snapshot is complete by construction, so running out of bytes means
/// the file was damaged.
fn read_exact(reader: &mut BufReader<File>, buf: &mut [u8]) -> EngineResult<()> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(EngineError::corruption("snapshot truncated"))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        // fsync on a directory flushes its entries, making the rename
        // durable.
        let dir = File::open(parent)?;
        dir.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    // NTFS journals metadata updates; directory fsync is not available.
    Ok(())
}
