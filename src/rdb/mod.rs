//! RDB snapshot reading.
//!
//! File format reference: <https://rdb.fnordig.de/file_format.html>
//!
//! The server reads snapshots to seed the cache at startup and never writes
//! them. [`parse_rdb`] decodes a whole file into an [`Rdb`] value;
//! [`load_cache`] wraps it with fail-open semantics so a missing or
//! malformed snapshot leaves the server running with an empty cache.

mod byte_stream;
mod encoding;
mod loader;
mod parser;

pub use loader::load_cache;
pub use parser::{
    parse_rdb, DatabaseSection, EndOfFile, Header, Metadata, NumBits, Rdb, RdbEntry,
};

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RdbError {
    #[error("unexpected end of snapshot: needed {needed} more bytes, {remaining} available")]
    ShortRead { needed: usize, remaining: usize },
    #[error("snapshot does not start with the REDIS magic")]
    BadMagic,
    #[error("invalid version digits in snapshot header")]
    BadVersion,
    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u8),
    #[error("invalid value for metadata key {key}: {value}")]
    BadMetadataValue { key: String, value: String },
    #[error("unsupported string encoding: 0x{0:02X}")]
    UnsupportedEncoding(u8),
    #[error("expected a length-prefixed integer, found a special string encoding")]
    NotAnInteger,
    #[error("expected database number {expected}, found {found}")]
    BadDatabaseNumber { expected: usize, found: u8 },
    #[error("database section is missing its resize record")]
    MissingResize,
    #[error("unsupported value type: 0x{0:02X}")]
    UnsupportedValueType(u8),
    #[error("section declared {declared} keys with expiry but {observed} were read")]
    ExpiryCountMismatch { declared: u32, observed: u32 },
    #[error("snapshot is missing its end-of-file marker")]
    MissingEndOfFile,
    #[error("expiry timestamp out of range")]
    BadExpiryTimestamp,
}
