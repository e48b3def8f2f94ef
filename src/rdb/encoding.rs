//! Length and string encodings used throughout the snapshot format.

use crate::rdb::byte_stream::ByteStream;
use crate::rdb::RdbError;

/// The two most significant bits of the first byte select the scheme.
const ENCODING_MASK: u8 = 0b1100_0000;

/// How the bytes following a length byte are to be read.
#[derive(Debug, PartialEq)]
pub(crate) enum StringEncoding {
    /// A raw string of this many bytes follows.
    Length(u32),
    /// An 8-bit integer follows, to be rendered as its decimal string.
    Int8,
    /// A 16-bit little-endian integer follows.
    Int16,
    /// A 32-bit little-endian integer follows.
    Int32,
}

/// Reads just enough bytes to determine the encoding of the string that
/// follows.
///
/// The schemes, selected by the top two bits of the first byte:
///
/// * `00` - the low six bits are the length (0-63)
/// * `01` - the low six bits are the high bits of a 14-bit length; one more
///   byte supplies the low eight (64-16383)
/// * `10` - the low six bits are discarded; the next four bytes are a
///   little-endian u32 length (16384 and up)
/// * `11` - a special encoding; the low six bits name an integer width.
///   Anything other than the three integer widths is unsupported.
pub(crate) fn read_string_encoding(stream: &mut ByteStream<'_>) -> Result<StringEncoding, RdbError> {
    let first = stream.read_u8()?;

    match first >> 6 {
        0b00 => Ok(StringEncoding::Length(u32::from(first & !ENCODING_MASK))),
        0b01 => {
            let low = stream.read_u8()?;
            let high = u32::from(first & !ENCODING_MASK);
            Ok(StringEncoding::Length(high << 8 | u32::from(low)))
        }
        0b10 => Ok(StringEncoding::Length(stream.read_u32_le()?)),
        _ => match first & !ENCODING_MASK {
            0 => Ok(StringEncoding::Int8),
            1 => Ok(StringEncoding::Int16),
            2 => Ok(StringEncoding::Int32),
            sub_format => Err(RdbError::UnsupportedEncoding(sub_format)),
        },
    }
}

/// Reads a length-encoded integer. The special integer encodings are not
/// valid here; only the length schemes are.
pub(crate) fn read_length_encoded_integer(stream: &mut ByteStream<'_>) -> Result<u32, RdbError> {
    match read_string_encoding(stream)? {
        StringEncoding::Length(value) => Ok(value),
        _ => Err(RdbError::NotAnInteger),
    }
}

/// Reads a length-encoded string: either that many raw bytes, or a special
/// integer formatted in base 10.
pub(crate) fn read_length_encoded_string(stream: &mut ByteStream<'_>) -> Result<Vec<u8>, RdbError> {
    match read_string_encoding(stream)? {
        StringEncoding::Length(length) => Ok(stream.read_string(length as usize)?.to_vec()),
        StringEncoding::Int8 => Ok(stream.read_u8()?.to_string().into_bytes()),
        StringEncoding::Int16 => Ok(stream.read_u16_le()?.to_string().into_bytes()),
        StringEncoding::Int32 => Ok(stream.read_u32_le()?.to_string().into_bytes()),
    }
}
