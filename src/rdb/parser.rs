//! Top-level structure of an RDB snapshot: header, metadata, database
//! sections and the end-of-file record, decoded in that order.

use std::collections::HashMap;

use bytes::Bytes;
use jiff::Timestamp;
use tracing::debug;

use crate::rdb::byte_stream::ByteStream;
use crate::rdb::encoding::{read_length_encoded_integer, read_length_encoded_string};
use crate::rdb::RdbError;

const EOF_OPCODE: u8 = 0xFF;
const DB_SELECTOR_OPCODE: u8 = 0xFE;
const EXPIRE_SECONDS_OPCODE: u8 = 0xFD;
const EXPIRE_MILLISECONDS_OPCODE: u8 = 0xFC;
const RESIZE_OPCODE: u8 = 0xFB;
const AUX_OPCODE: u8 = 0xFA;

/// The only supported value type: a string-encoded value.
const STRING_VALUE_TYPE: u8 = 0x00;

const MAGIC: &[u8; 5] = b"REDIS";
const MIN_SUPPORTED_VERSION: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumBits {
    Bits32,
    Bits64,
}

/// Auxiliary fields from the snapshot's AUX entries. Unknown keys are logged
/// and ignored.
#[derive(Debug, Default, PartialEq)]
pub struct Metadata {
    pub creation_time: Option<u64>,
    pub used_memory: Option<u64>,
    pub redis_version: Option<String>,
    pub redis_num_bits: Option<NumBits>,
}

/// A key's value and optional absolute expiry as recorded in the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RdbEntry {
    pub value: Bytes,
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Default, PartialEq)]
pub struct DatabaseSection {
    pub entries: HashMap<Bytes, RdbEntry>,
}

/// The trailing CRC64 is captured verbatim; it is not verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfFile {
    pub crc64: [u8; 8],
}

/// The in-memory result of parsing a snapshot file.
#[derive(Debug, PartialEq)]
pub struct Rdb {
    pub header: Header,
    pub metadata: Metadata,
    pub database_sections: Vec<DatabaseSection>,
    pub end_of_file: EndOfFile,
}

/// Parses a whole snapshot file.
pub fn parse_rdb(buffer: &[u8]) -> Result<Rdb, RdbError> {
    let mut stream = ByteStream::new(buffer);

    let header = read_header(&mut stream)?;
    let metadata = read_metadata(&mut stream)?;
    let database_sections = read_database_sections(&mut stream)?;
    let end_of_file = read_end_of_file(&mut stream)?;

    Ok(Rdb {
        header,
        metadata,
        database_sections,
        end_of_file,
    })
}

/// Five magic bytes `REDIS`, then four ASCII digits for the version.
fn read_header(stream: &mut ByteStream<'_>) -> Result<Header, RdbError> {
    let magic = stream.read_exact(MAGIC.len())?;
    if magic != MAGIC {
        return Err(RdbError::BadMagic);
    }

    let digits = stream.read_exact(4)?;
    let version = std::str::from_utf8(digits)
        .ok()
        .and_then(|text| text.parse::<u8>().ok())
        .ok_or(RdbError::BadVersion)?;

    if version < MIN_SUPPORTED_VERSION {
        return Err(RdbError::UnsupportedVersion(version));
    }

    Ok(Header { version })
}

fn read_metadata(stream: &mut ByteStream<'_>) -> Result<Metadata, RdbError> {
    let mut metadata = Metadata::default();

    while stream.consume_if_byte(AUX_OPCODE) {
        let key = read_length_encoded_string(stream)?;
        let value = read_length_encoded_string(stream)?;

        match key.as_slice() {
            b"ctime" => metadata.creation_time = Some(parse_numeric_value(&key, &value)?),
            b"used-mem" => metadata.used_memory = Some(parse_numeric_value(&key, &value)?),
            b"redis-bits" => {
                metadata.redis_num_bits = match parse_numeric_value(&key, &value)? {
                    32 => Some(NumBits::Bits32),
                    64 => Some(NumBits::Bits64),
                    _ => return Err(bad_metadata(&key, &value)),
                }
            }
            b"redis-ver" => {
                let version =
                    String::from_utf8(value.clone()).map_err(|_| bad_metadata(&key, &value))?;
                metadata.redis_version = Some(version);
            }
            _ => debug!(
                key = %String::from_utf8_lossy(&key),
                value = %String::from_utf8_lossy(&value),
                "ignoring unknown metadata key"
            ),
        }
    }

    Ok(metadata)
}

/// Database sections follow one another; section N must declare database
/// number N. Each section announces its entry counts in a resize record and
/// must deliver exactly as many expiry-bearing keys as it declared.
fn read_database_sections(stream: &mut ByteStream<'_>) -> Result<Vec<DatabaseSection>, RdbError> {
    let mut sections = Vec::new();

    while stream.consume_if_byte(DB_SELECTOR_OPCODE) {
        let number = stream.read_u8()?;
        if usize::from(number) != sections.len() {
            return Err(RdbError::BadDatabaseNumber {
                expected: sections.len(),
                found: number,
            });
        }

        if !stream.consume_if_byte(RESIZE_OPCODE) {
            return Err(RdbError::MissingResize);
        }
        let num_entries = read_length_encoded_integer(stream)?;
        let num_expiries = read_length_encoded_integer(stream)?;

        let mut section = DatabaseSection::default();
        let mut expiries_seen: u32 = 0;

        for _ in 0..num_entries {
            let expires_at = read_optional_expiry(stream)?;
            if expires_at.is_some() {
                expiries_seen += 1;
            }

            let value_type = stream.read_u8()?;
            if value_type != STRING_VALUE_TYPE {
                return Err(RdbError::UnsupportedValueType(value_type));
            }

            let key = Bytes::from(read_length_encoded_string(stream)?);
            let value = Bytes::from(read_length_encoded_string(stream)?);
            section.entries.insert(key, RdbEntry { value, expires_at });
        }

        if expiries_seen != num_expiries {
            return Err(RdbError::ExpiryCountMismatch {
                declared: num_expiries,
                observed: expiries_seen,
            });
        }

        sections.push(section);
    }

    Ok(sections)
}

/// An entry may be prefixed by an expiry: a 4-byte little-endian Unix-seconds
/// timestamp, or an 8-byte little-endian Unix-milliseconds timestamp.
fn read_optional_expiry(stream: &mut ByteStream<'_>) -> Result<Option<Timestamp>, RdbError> {
    if stream.consume_if_byte(EXPIRE_SECONDS_OPCODE) {
        let seconds = stream.read_u32_le()?;
        let timestamp = Timestamp::from_second(i64::from(seconds))
            .map_err(|_| RdbError::BadExpiryTimestamp)?;
        return Ok(Some(timestamp));
    }

    if stream.consume_if_byte(EXPIRE_MILLISECONDS_OPCODE) {
        let milliseconds =
            i64::try_from(stream.read_u64_le()?).map_err(|_| RdbError::BadExpiryTimestamp)?;
        let timestamp =
            Timestamp::from_millisecond(milliseconds).map_err(|_| RdbError::BadExpiryTimestamp)?;
        return Ok(Some(timestamp));
    }

    Ok(None)
}

fn read_end_of_file(stream: &mut ByteStream<'_>) -> Result<EndOfFile, RdbError> {
    if !stream.consume_if_byte(EOF_OPCODE) {
        return Err(RdbError::MissingEndOfFile);
    }

    let bytes = stream.read_exact(8)?;
    let mut crc64 = [0u8; 8];
    crc64.copy_from_slice(bytes);

    Ok(EndOfFile { crc64 })
}

fn parse_numeric_value(key: &[u8], value: &[u8]) -> Result<u64, RdbError> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|text| text.parse::<u64>().ok())
        .ok_or_else(|| bad_metadata(key, value))
}

fn bad_metadata(key: &[u8], value: &[u8]) -> RdbError {
    RdbError::BadMetadataValue {
        key: String::from_utf8_lossy(key).into_owned(),
        value: String::from_utf8_lossy(value).into_owned(),
    }
}
