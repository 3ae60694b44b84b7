//! WAL record types and serialization.

use crate::checksum::crc32;
use crate::error::{EngineError, EngineResult};
use crate::types::{Key, Value, MAX_KEY_SIZE, MAX_VALUE_SIZE};

/// Type tag of a WAL record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WalRecordType {
    /// Insert or overwrite a key.
    Put = 1,
    /// Delete a key.
    Delete = 2,
    /// Overwrite an existing key.
    Update = 3,
    /// Advisory checkpoint marker.
    Checkpoint = 4,
}

impl WalRecordType {
    /// Converts a byte to a record type.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Put),
            2 => Some(Self::Delete),
            3 => Some(Self::Update),
            4 => Some(Self::Checkpoint),
            _ => None,
        }
    }

    /// Converts the record type to its on-disk byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A WAL record representing one engine mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalRecord {
    /// Insert or overwrite a key.
    Put {
        /// The key being written.
        key: Key,
        /// The value being written.
        value: Value,
    },
    /// Delete a key.
    Delete {
        /// The key being deleted.
        key: Key,
    },
    /// Overwrite an existing key.
    Update {
        /// The key being updated.
        key: Key,
        /// The new value.
        value: Value,
    },
    /// Advisory checkpoint marker. Carries no payload; replay skips it.
    Checkpoint,
}

impl WalRecord {
    /// Returns the record type tag.
    #[must_use]
    pub fn record_type(&self) -> WalRecordType {
        match self {
            Self::Put { .. } => WalRecordType::Put,
            Self::Delete { .. } => WalRecordType::Delete,
            Self::Update { .. } => WalRecordType::Update,
            Self::Checkpoint => WalRecordType::Checkpoint,
        }
    }

    fn payload(&self) -> (&[u8], &[u8]) {
        match self {
            Self::Put { key, value } | Self::Update { key, value } => (key, value),
            Self::Delete { key } => (key, &[]),
            Self::Checkpoint => (&[], &[]),
        }
    }

    /// Serializes the record into its exact on-disk byte image.
    ///
    /// Layout: `type | key_len | key | value_len | value | crc32`, all
    /// lengths and the CRC little-endian. The CRC covers every byte
    /// before it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the key or value exceeds the
    /// configured maximum size.
    pub fn encode(&self) -> EngineResult<Vec<u8>> {
        let (key, value) = self.payload();

        if key.len() > MAX_KEY_SIZE {
            return Err(EngineError::invalid_argument(format!(
                "key length {} exceeds maximum of {MAX_KEY_SIZE}",
                key.len()
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(EngineError::invalid_argument(format!(
                "value length {} exceeds maximum of {MAX_VALUE_SIZE}",
                value.len()
            )));
        }

        let mut buf = Vec::with_capacity(1 + 4 + key.len() + 4 + value.len() + 4);
        buf.push(self.record_type().as_byte());
        buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        buf.extend_from_slice(value);

        let crc = crc32(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());

        Ok(buf)
    }

    /// Reassembles a record from its decoded parts.
    ///
    /// The reader has already validated framing and CRC; DELETE and
    /// CHECKPOINT records discard any payload bytes that were framed
    /// with them.
    #[must_use]
    pub(crate) fn from_parts(record_type: WalRecordType, key: Key, value: Value) -> Self {
        match record_type {
            WalRecordType::Put => Self::Put { key, value },
            WalRecordType::Update => Self::Update { key, value },
            WalRecordType::Delete => Self::Delete { key },
            WalRecordType::Checkpoint => Self::Checkpoint,
        }
    }
}
