//! # emberdb core
//!
//! Core engine for emberdb, an embedded, single-process, crash-safe
//! key-value store.
//!
//! This crate provides:
//! - An in-memory B+Tree index with ordered traversal
//! - A CRC-framed write-ahead log for durability
//! - Atomic whole-tree snapshots for bounded recovery time
//! - An [`Engine`] facade that binds the three together
//!
//! ## Example
//!
//! ```no_run
//! use emberdb_core::Engine;
//!
//! let mut engine = Engine::open("data/ember.wal");
//! engine.recover_from_wal().unwrap();
//!
//! engine.put(b"apple".to_vec(), b"red".to_vec()).unwrap();
//! engine.flush_wal().unwrap();
//!
//! assert_eq!(engine.get(b"apple"), Some(b"red".to_vec()));
//! ```
//!
//! ## Concurrency
//!
//! The engine is single-threaded: all mutating operations take
//! `&mut self` and there is no internal locking. A multi-threaded host
//! must serialize access externally.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod checksum;
mod config;
mod engine;
mod error;
pub mod snapshot;
pub mod tree;
mod types;
pub mod wal;

pub use config::Config;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use tree::BTree;
pub use types::{Key, Value, MAX_KEY_SIZE, MAX_VALUE_SIZE};
