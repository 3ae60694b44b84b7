//! Fuzz testing harnesses for emberdb.
//!
//! This module provides fuzz targets that can be used with cargo-fuzz or
//! other fuzzing frameworks. Each target takes an arbitrary byte slice
//! and must never panic: malformed input has to surface as a clean
//! corruption error, valid input has to decode.
//!
//! The seeded tests at the bottom run the same targets over
//! pseudo-random data so CI exercises them without a fuzzing engine.

use emberdb_core::snapshot::SnapshotReader;
use emberdb_core::wal::WalReader;
use emberdb_core::Engine;
use emberdb_storage::InMemoryBackend;

/// Fuzz target for WAL record decoding.
///
/// Feeds arbitrary bytes to the streaming reader and drains it. Every
/// outcome other than a decoded record or a clean end of log must be a
/// corruption report - never a panic, never silence.
pub fn fuzz_wal_decode(data: &[u8]) {
    let backend = InMemoryBackend::with_data(data.to_vec());
    let mut reader = match WalReader::new(Box::new(backend)) {
        Ok(reader) => reader,
        Err(_) => return,
    };

    loop {
        match reader.read_next() {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => {
                assert!(
                    e.is_corruption(),
                    "malformed WAL bytes must decode as corruption, got {e:?}"
                );
                break;
            }
        }
    }
}

/// Fuzz target for snapshot decoding.
///
/// Writes arbitrary bytes as a snapshot file and streams it back. Any
/// failure must be a corruption report, never a panic.
///
/// # Panics
///
/// Panics only on temp-file setup failure, or if a decode error is not
/// classified as corruption.
pub fn fuzz_snapshot_decode(data: &[u8]) {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let path = dir.path().join("fuzz.snapshot");
    std::fs::write(&path, data).expect("failed to write snapshot bytes");

    let mut reader = match SnapshotReader::open(&path) {
        Ok(reader) => reader,
        Err(e) => {
            assert!(
                e.is_corruption(),
                "malformed snapshot header must decode as corruption, got {e:?}"
            );
            return;
        }
    };

    loop {
        match reader.read_entry() {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => {
                assert!(
                    e.is_corruption(),
                    "malformed snapshot entry must decode as corruption, got {e:?}"
                );
                break;
            }
        }
    }
}

/// Fuzz target for the full recovery path.
///
/// Plants arbitrary bytes as a WAL file, opens an engine over it, runs
/// recovery, and probes the result. Recovery may succeed or report
/// corruption; it must not panic, and the engine must stay usable for
/// reads either way.
///
/// # Panics
///
/// Panics only on temp-file setup failure.
pub fn fuzz_wal_recovery(data: &[u8]) {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let wal_path = dir.path().join("fuzz.wal");
    std::fs::write(&wal_path, data).expect("failed to write WAL bytes");

    let mut engine = Engine::open(&wal_path);
    let _ = engine.recover_from_wal();

    for i in 0..5 {
        let _ = engine.get(format!("key_{i}").as_bytes());
    }
    engine.iterate_all(|_, _| {});
}

/// Fuzz target for engine operation sequences.
///
/// Decodes arbitrary bytes into a stream of put/get/update/remove calls
/// against an in-memory engine. Oversized payloads and missing keys are
/// expected errors; nothing may panic.
pub fn fuzz_engine_operations(data: &[u8]) {
    let mut engine = Engine::new();
    let mut offset = 0;

    while offset + 2 <= data.len() {
        let op = data[offset];
        let key_len = (data[offset + 1] as usize) % 16;
        offset += 2;

        if offset + key_len > data.len() {
            break;
        }
        let key = data[offset..offset + key_len].to_vec();
        offset += key_len;

        match op % 4 {
            0 => {
                let value_len = data.get(offset).copied().unwrap_or(0) as usize;
                offset += 1;
                let value = if offset + value_len <= data.len() {
                    data[offset..offset + value_len].to_vec()
                } else {
                    vec![0u8; value_len]
                };
                offset += value_len.min(data.len().saturating_sub(offset));
                let _ = engine.put(key, value);
            }
            1 => {
                let _ = engine.get(&key);
            }
            2 => {
                let _ = engine.update(key, b"updated".to_vec());
            }
            _ => {
                let _ = engine.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberdb_core::wal::WalRecord;
    use std::hash::{DefaultHasher, Hash, Hasher};

    /// Generate pseudo-random data for fuzzing based on a seed.
    fn generate_random_data(seed: u64, len: usize) -> Vec<u8> {
        let mut hasher = DefaultHasher::new();
        let mut result = Vec::with_capacity(len);
        let mut state = seed;

        for _ in 0..len {
            state.hash(&mut hasher);
            state = hasher.finish();
            hasher = DefaultHasher::new();
            result.push((state & 0xFF) as u8);
        }

        result
    }

    fn valid_wal_image() -> Vec<u8> {
        let mut bytes = Vec::new();
        for i in 0..5u32 {
            bytes.extend_from_slice(
                &WalRecord::Put {
                    key: format!("key_{i}").into_bytes(),
                    value: format!("value_{i}").into_bytes(),
                }
                .encode()
                .unwrap(),
            );
        }
        bytes
    }

    #[test]
    fn wal_decode_empty() {
        fuzz_wal_decode(&[]);
    }

    #[test]
    fn wal_decode_garbage() {
        fuzz_wal_decode(&[0xFF, 0xFF, 0xFF, 0xFF]);
        fuzz_wal_decode(b"this is not a write-ahead log");
    }

    #[test]
    fn wal_decode_valid_prefix_then_garbage() {
        let mut bytes = valid_wal_image();
        bytes.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        fuzz_wal_decode(&bytes);
    }

    #[test]
    fn wal_decode_every_truncation() {
        let full = valid_wal_image();
        for cut in 0..full.len() {
            fuzz_wal_decode(&full[..cut]);
        }
    }

    #[test]
    fn wal_decode_every_byte_flip() {
        let full = valid_wal_image();
        for i in 0..full.len() {
            let mut bytes = full.clone();
            bytes[i] ^= 0xFF;
            fuzz_wal_decode(&bytes);
        }
    }

    #[test]
    fn snapshot_decode_empty_and_garbage() {
        fuzz_snapshot_decode(&[]);
        fuzz_snapshot_decode(&[0x52, 0x42, 0x4D]);
        fuzz_snapshot_decode(b"not a snapshot at all, sorry");
    }

    #[test]
    fn recovery_empty_and_garbage() {
        fuzz_wal_recovery(&[]);
        fuzz_wal_recovery(b"garbage garbage garbage");
    }

    #[test]
    fn recovery_valid_log() {
        fuzz_wal_recovery(&valid_wal_image());
    }

    // Extended randomized fuzz tests for CI

    #[test]
    fn wal_decode_random_iterations() {
        for seed in 0..1000u64 {
            let len = ((seed % 256) + 1) as usize;
            let data = generate_random_data(seed, len);
            fuzz_wal_decode(&data);
        }
    }

    #[test]
    fn snapshot_decode_random_iterations() {
        for seed in 0..200u64 {
            let len = ((seed % 256) + 1) as usize;
            let data = generate_random_data(seed, len);
            fuzz_snapshot_decode(&data);
        }
    }

    #[test]
    fn wal_recovery_random_iterations() {
        // Fewer iterations since each round touches the filesystem.
        for seed in 0..50u64 {
            let len = ((seed % 512) + 10) as usize;
            let data = generate_random_data(seed, len);
            fuzz_wal_recovery(&data);
        }
    }

    #[test]
    fn engine_operations_random_iterations() {
        for seed in 0..100u64 {
            let len = ((seed % 512) + 32) as usize;
            let data = generate_random_data(seed, len);
            fuzz_engine_operations(&data);
        }
    }
}
