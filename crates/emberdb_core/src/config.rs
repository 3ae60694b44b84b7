//! Engine configuration.

/// Configuration for opening an engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// How many applied mutations between automatic checkpoints
    /// (0 = never checkpoint automatically).
    pub checkpoint_interval: u64,

    /// Capacity of the WAL writer's append buffer in bytes.
    pub wal_buffer_size: usize,

    /// Maximum number of keys a tree node may hold before splitting.
    /// Must be at least 3.
    pub max_degree: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checkpoint_interval: 10_000,
            wal_buffer_size: 4096,
            max_degree: 4,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the auto-checkpoint interval (0 disables).
    #[must_use]
    pub const fn checkpoint_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Sets the WAL buffer capacity.
    #[must_use]
    pub const fn wal_buffer_size(mut self, size: usize) -> Self {
        self.wal_buffer_size = size;
        self
    }

    /// Sets the maximum node degree.
    #[must_use]
    pub const fn max_degree(mut self, degree: usize) -> Self {
        self.max_degree = degree;
        self
    }
}
