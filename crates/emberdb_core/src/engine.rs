//! Engine facade: write-ahead logging, checkpoints, and recovery.

use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::snapshot::{SnapshotReader, Snapshotter};
use crate::tree::BTree;
use crate::types::{check_limits, Key, Value};
use crate::wal::{WalReader, WalRecord, WalWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// The embedded key-value engine.
///
/// Binds the in-memory B+Tree to a write-ahead log and a snapshot file,
/// and enforces the durability protocol:
///
/// - Every mutating call appends its WAL record **before** the tree is
///   touched; if the append fails, the call aborts with the tree
///   unchanged.
/// - [`Engine::flush_wal`] (or a checkpoint) makes acknowledged
///   mutations durable.
/// - [`Engine::recover_from_wal`] rebuilds the tree from the snapshot
///   plus the WAL tail after a restart or crash.
///
/// The snapshot lives at `<wal_path>.snapshot`; no other files are
/// produced. An engine without a WAL path keeps everything in memory and
/// promises no durability.
///
/// # Example
///
/// ```no_run
/// use emberdb_core::Engine;
///
/// let mut engine = Engine::open("data/ember.wal");
/// engine.recover_from_wal().unwrap();
/// engine.put(b"k".to_vec(), b"v".to_vec()).unwrap();
/// engine.flush_wal().unwrap();
/// ```
pub struct Engine {
    tree: BTree,
    wal: Option<WalWriter>,
    snapshotter: Option<Snapshotter>,
    wal_path: Option<PathBuf>,
    recovering: bool,
    op_count: u64,
    checkpoint_interval: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with no WAL: purely in-memory, no durability.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Creates a WAL-less engine with a custom configuration.
    #[must_use]
    pub fn with_config(config: &Config) -> Self {
        Self {
            tree: BTree::with_max_degree(config.max_degree),
            wal: None,
            snapshotter: None,
            wal_path: None,
            recovering: false,
            op_count: 0,
            checkpoint_interval: config.checkpoint_interval,
        }
    }

    /// Opens an engine logging to the WAL at `wal_path`.
    ///
    /// Never fails: a WAL open failure disables durability (subsequent
    /// mutations return an I/O error) but does not crash. Call
    /// [`Engine::recover_from_wal`] before the first operation to load
    /// any prior state.
    #[must_use]
    pub fn open(wal_path: impl Into<PathBuf>) -> Self {
        Self::open_with_config(wal_path, &Config::default())
    }

    /// Opens an engine with a custom configuration.
    #[must_use]
    pub fn open_with_config(wal_path: impl Into<PathBuf>, config: &Config) -> Self {
        let wal_path = wal_path.into();
        let wal = WalWriter::open(&wal_path, config.wal_buffer_size);

        let snapshot_path = {
            let mut os = wal_path.clone().into_os_string();
            os.push(".snapshot");
            PathBuf::from(os)
        };

        Self {
            tree: BTree::with_max_degree(config.max_degree),
            wal: Some(wal),
            snapshotter: Some(Snapshotter::new(snapshot_path)),
            wal_path: Some(wal_path),
            recovering: false,
            op_count: 0,
            checkpoint_interval: config.checkpoint_interval,
        }
    }

    /// Looks up a key.
    ///
    /// Never fails and never touches the WAL.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<Value> {
        self.tree.get(key).map(<[u8]>::to_vec)
    }

    /// Inserts a key or overwrites its value.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for oversized key/value; `IOError` if the WAL
    /// append fails. On error the tree is unchanged.
    pub fn put(&mut self, key: Key, value: Value) -> EngineResult<()> {
        if !self.recovering {
            if let Some(wal) = self.wal.as_mut() {
                wal.write_put(&key, &value)?;
            }
        }
        self.tree.put(key, value)?;
        self.after_mutation();
        Ok(())
    }

    /// Overwrites the value of an existing key.
    ///
    /// # Errors
    ///
    /// `NotFound` if the key is absent (no WAL record is written),
    /// `InvalidArgument` for oversized key/value, `IOError` on WAL
    /// failure. On error the tree is unchanged.
    pub fn update(&mut self, key: Key, value: Value) -> EngineResult<()> {
        check_limits(&key, &value)?;
        // Resolve presence before logging: a failed update must leave no
        // trace, or replay would resurrect it as a PUT.
        if self.tree.get(&key).is_none() {
            return Err(EngineError::NotFound);
        }
        if !self.recovering {
            if let Some(wal) = self.wal.as_mut() {
                wal.write_update(&key, &value)?;
            }
        }
        self.tree.update(&key, value)?;
        self.after_mutation();
        Ok(())
    }

    /// Removes a key.
    ///
    /// # Errors
    ///
    /// `NotFound` if the key is absent (no WAL record is written),
    /// `IOError` on WAL failure. On error the tree is unchanged.
    pub fn remove(&mut self, key: &[u8]) -> EngineResult<()> {
        if self.tree.get(key).is_none() {
            return Err(EngineError::NotFound);
        }
        if !self.recovering {
            if let Some(wal) = self.wal.as_mut() {
                wal.write_delete(key)?;
            }
        }
        self.tree.remove(key)?;
        self.after_mutation();
        Ok(())
    }

    /// Visits every pair in ascending key order. Performs no I/O.
    pub fn iterate_all<F>(&self, visit: F)
    where
        F: FnMut(&[u8], &[u8]),
    {
        self.tree.iterate_all(visit);
    }

    /// Number of key-value pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the engine holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Flushes and durably syncs the WAL. No-op without a WAL path.
    ///
    /// Acknowledged mutations are guaranteed to survive a crash only
    /// after this (or a checkpoint) returns successfully.
    ///
    /// # Errors
    ///
    /// Returns the WAL's I/O error.
    pub fn flush_wal(&mut self) -> EngineResult<()> {
        match self.wal.as_mut() {
            Some(wal) => wal.sync(),
            None => Ok(()),
        }
    }

    /// Sets how many mutations pass between automatic checkpoints
    /// (0 disables them).
    pub fn set_checkpoint_interval(&mut self, interval: u64) {
        self.checkpoint_interval = interval;
    }

    /// Publishes a snapshot of the current tree and truncates the WAL.
    ///
    /// The snapshot is durably published *before* the WAL is truncated;
    /// a crash in between leaves a valid snapshot plus the old,
    /// still-complete WAL, which recovery handles. Post-snapshot WAL
    /// maintenance failures are logged, not surfaced: the checkpoint
    /// itself succeeded and the engine remains consistent.
    ///
    /// # Errors
    ///
    /// Returns the snapshotter's error if publishing the snapshot fails.
    pub fn create_checkpoint(&mut self) -> EngineResult<()> {
        let Some(snapshotter) = self.snapshotter.as_ref() else {
            return Ok(());
        };

        snapshotter.create(&self.tree)?;

        if let Some(wal) = self.wal.as_mut() {
            if let Err(e) = wal.sync() {
                warn!(error = %e, "WAL sync before truncation failed");
            }
            match wal.truncate_and_reset() {
                Ok(()) => {
                    // Advisory boundary marker at the head of the fresh log.
                    if let Err(e) = wal.write_checkpoint() {
                        warn!(error = %e, "could not write checkpoint marker");
                    }
                }
                Err(e) => {
                    error!(error = %e, "WAL truncation after checkpoint failed");
                }
            }
        }
        Ok(())
    }

    /// Rebuilds the tree from the snapshot (if any) and the WAL.
    ///
    /// Idempotent and safe to call only on a freshly opened engine; WAL
    /// appends are suppressed while replaying so records are not written
    /// back.
    ///
    /// # Errors
    ///
    /// Surfaces `Corruption` from either file unchanged, plus any I/O
    /// error. The replay flag is reset on every exit path.
    pub fn recover_from_wal(&mut self) -> EngineResult<()> {
        if self.wal_path.is_none() {
            return Ok(());
        }
        self.recovering = true;
        let result = self.replay();
        self.recovering = false;
        result
    }

    fn replay(&mut self) -> EngineResult<()> {
        if let Some(snapshot_path) = self.snapshotter.as_ref().map(|s| s.path().to_path_buf()) {
            if snapshot_path.exists() {
                let mut reader = SnapshotReader::open(&snapshot_path)?;
                while let Some((key, value)) = reader.read_entry()? {
                    self.put(key, value)?;
                }
                debug!(entries = self.tree.len(), "snapshot loaded");
            }
        }

        let Some(wal_path) = self.wal_path.clone() else {
            return Ok(());
        };
        if !wal_path.exists() {
            return Ok(());
        }

        let mut reader = WalReader::open(&wal_path)?;
        let mut replayed = 0usize;
        while let Some(record) = reader.read_next()? {
            match record {
                WalRecord::Put { key, value } => self.put(key, value)?,
                WalRecord::Update { key, value } => {
                    // The creating PUT may have been absorbed into the
                    // snapshot before the WAL was truncated; upgrade.
                    if self.tree.get(&key).is_some() {
                        self.update(key, value)?;
                    } else {
                        self.put(key, value)?;
                    }
                }
                WalRecord::Delete { key } => match self.remove(&key) {
                    Ok(()) | Err(EngineError::NotFound) => {}
                    Err(e) => return Err(e),
                },
                WalRecord::Checkpoint => {}
            }
            replayed += 1;
        }

        info!(records = replayed, entries = self.tree.len(), "recovery complete");
        Ok(())
    }

    /// The WAL path, if durability is configured.
    #[must_use]
    pub fn wal_path(&self) -> Option<&Path> {
        self.wal_path.as_deref()
    }

    /// The snapshot path, if durability is configured.
    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshotter.as_ref().map(Snapshotter::path)
    }

    fn after_mutation(&mut self) {
        if self.recovering {
            return;
        }
        self.op_count += 1;
        if self.checkpoint_interval > 0 && self.op_count % self.checkpoint_interval == 0 {
            if let Err(e) = self.create_checkpoint() {
                warn!(error = %e, "automatic checkpoint failed");
            }
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("entries", &self.tree.len())
            .field("wal_path", &self.wal_path)
            .field("checkpoint_interval", &self.checkpoint_interval)
            .finish_non_exhaustive()
    }
}
