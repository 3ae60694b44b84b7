//! Error types for the emberdb core.

use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in emberdb core operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The target key does not exist.
    #[error("key not found")]
    NotFound,

    /// An argument violated a size limit or other precondition.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the violation.
        message: String,
    },

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] emberdb_storage::StorageError),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Framing, length, magic, version, or CRC violation detected while
    /// reading the WAL or a snapshot.
    #[error("corruption: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },

    /// A stored checksum did not match the recomputed value.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// The checksum stored on disk.
        expected: u32,
        /// The checksum computed over the data read.
        actual: u32,
    },

    /// The operation is not supported.
    #[error("not supported: {message}")]
    NotSupported {
        /// Description of the unsupported operation.
        message: String,
    },
}

impl EngineError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Creates a not supported error.
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported {
            message: message.into(),
        }
    }

    /// Returns `true` if this error reports corrupted on-disk data.
    ///
    /// Covers both framing violations and checksum mismatches.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Corruption { .. } | Self::ChecksumMismatch { .. }
        )
    }
}
