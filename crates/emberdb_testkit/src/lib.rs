//! # emberdb testkit
//!
//! Test utilities for emberdb:
//! - Engine fixtures with automatic temp-directory cleanup
//! - Property-based test generators using proptest
//! - A reference-model runner for state-machine tests
//! - Fuzz targets for the WAL, snapshot, and recovery decode paths
//!
//! ## Usage
//!
//! ```rust
//! use emberdb_testkit::TestEngine;
//!
//! let mut fixture = TestEngine::durable();
//! fixture.engine.put(b"k".to_vec(), b"v".to_vec()).unwrap();
//! let recovered = fixture.reopen();
//! assert_eq!(recovered.engine.get(b"k"), Some(b"v".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;

pub use fixtures::TestEngine;
pub use fuzz::{fuzz_engine_operations, fuzz_snapshot_decode, fuzz_wal_decode, fuzz_wal_recovery};
pub use generators::{key_strategy, op_sequence_strategy, value_strategy, Op};
