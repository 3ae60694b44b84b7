//! Write-ahead log: record framing, buffered writer, streaming reader.
//!
//! Every mutation is serialized into a CRC-protected record and appended
//! to the log **before** the in-memory tree is touched. Replaying the log
//! on startup reconstructs every acknowledged operation.
//!
//! ## On-disk record layout (little-endian)
//!
//! ```text
//! type:u8 | key_len:u32 | key | value_len:u32 | value | crc32:u32
//! ```
//!
//! The CRC covers every preceding byte of the record.

mod reader;
mod record;
mod writer;

pub use reader::WalReader;
pub use record::{WalRecord, WalRecordType};
pub use writer::WalWriter;
