//! Common types and size limits.

/// A key: an opaque byte string, compared lexicographically as unsigned
/// bytes. Empty keys are legal.
pub type Key = Vec<u8>;

/// A value: an opaque byte string. Empty values are legal.
pub type Value = Vec<u8>;

/// Maximum accepted key length in bytes.
pub const MAX_KEY_SIZE: usize = 128;

/// Maximum accepted value length in bytes.
pub const MAX_VALUE_SIZE: usize = 1024;

/// Validates key and value sizes against the configured maxima.
pub(crate) fn check_limits(key: &[u8], value: &[u8]) -> crate::EngineResult<()> {
    if key.len() > MAX_KEY_SIZE {
        return Err(crate::EngineError::invalid_argument(format!(
            "key length {} exceeds maximum of {MAX_KEY_SIZE}",
            key.len()
        )));
    }
    if value.len() > MAX_VALUE_SIZE {
        return Err(crate::EngineError::invalid_argument(format!(
            "value length {} exceeds maximum of {MAX_VALUE_SIZE}",
            value.len()
        )));
    }
    Ok(())
}
