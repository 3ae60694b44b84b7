//! Engine fixtures with automatic cleanup.

use emberdb_core::{Config, Engine};
use std::path::PathBuf;
use tempfile::TempDir;

/// A test engine with automatic temp-directory cleanup.
///
/// The temp directory lives as long as the fixture, so the WAL and
/// snapshot survive [`TestEngine::reopen`] calls and disappear when the
/// fixture is dropped.
pub struct TestEngine {
    /// The engine under test.
    pub engine: Engine,
    /// Owning handle for the backing directory (None for WAL-less engines).
    temp_dir: Option<TempDir>,
}

impl TestEngine {
    /// Creates a WAL-less in-memory engine.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            engine: Engine::new(),
            temp_dir: None,
        }
    }

    /// Creates an engine with a WAL in a fresh temp directory.
    ///
    /// # Panics
    ///
    /// Panics if the temp directory cannot be created.
    #[must_use]
    pub fn durable() -> Self {
        Self::durable_with_config(&Config::default())
    }

    /// Creates a durable engine with a custom configuration.
    ///
    /// # Panics
    ///
    /// Panics if the temp directory cannot be created.
    #[must_use]
    pub fn durable_with_config(config: &Config) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let engine = Engine::open_with_config(temp_dir.path().join("ember.wal"), config);
        Self {
            engine,
            temp_dir: Some(temp_dir),
        }
    }

    /// Path of the engine's WAL, if durable.
    #[must_use]
    pub fn wal_path(&self) -> Option<PathBuf> {
        self.engine.wal_path().map(PathBuf::from)
    }

    /// Simulates a restart: drops the engine (best-effort sync), opens a
    /// fresh one over the same files, and runs recovery.
    ///
    /// # Panics
    ///
    /// Panics for WAL-less fixtures or if recovery fails.
    #[must_use]
    pub fn reopen(self) -> Self {
        let wal_path = self.wal_path().expect("reopen requires a durable fixture");
        let temp_dir = self.temp_dir;
        drop(self.engine);

        let mut engine = Engine::open(&wal_path);
        engine.recover_from_wal().expect("recovery failed on reopen");
        Self { engine, temp_dir }
    }

    /// Collects the full (key, value) enumeration in order.
    #[must_use]
    pub fn contents(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut pairs = Vec::new();
        self.engine.iterate_all(|k, v| pairs.push((k.to_vec(), v.to_vec())));
        pairs
    }
}
