//! RESP2 wire codec.
//!
//! Protocol specification: <https://redis.io/docs/latest/develop/reference/protocol-spec/>
//!
//! Every client/server interaction is framed as a [`Message`]. The first byte
//! of a frame identifies its kind, the payload follows, and `\r\n` terminates
//! each part. Decoding works over an [`std::io::Cursor`] so that the
//! connection layer can retry once more bytes arrive; a whole-buffer entry
//! point is provided for callers that already hold a complete frame.

use std::io::Cursor;

use bytes::{Buf, Bytes};
use thiserror::Error;

/// Terminator separating the parts of a RESP frame.
const TERMINATOR: &[u8; 2] = b"\r\n";

#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    /// The buffer ends before the frame does. The connection layer treats
    /// this as "read more bytes and retry".
    #[error("incomplete frame")]
    ShortRead,
    #[error("unknown message type tag: 0x{0:02X}")]
    BadType(u8),
    #[error("malformed frame: {0}")]
    BadFrame(String),
}

/// A single RESP2 message.
///
/// The empty bulk string and [`Message::NullBulkString`] are distinct values:
/// the former serializes as `$0\r\n\r\n`, the latter as `$-1\r\n`. Arrays are
/// flat; the decoder rejects an array element that is itself an array.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    SimpleString(String),
    SimpleError(String),
    Integer(i64),
    BulkString(Bytes),
    NullBulkString,
    Array(Vec<Message>),
}

impl Message {
    /// Decodes one message starting at the cursor position.
    ///
    /// On success the cursor sits one past the frame's final terminator.
    /// [`RespError::ShortRead`] means the frame continues beyond the end of
    /// the buffer; the cursor position is unspecified in every error case.
    pub fn decode(src: &mut Cursor<&[u8]>) -> Result<Message, RespError> {
        let tag = read_byte(src)?;

        match tag {
            b'+' => {
                let line = read_line(src)?;
                Ok(Message::SimpleString(line_to_string(line)?))
            }
            b'-' => {
                let line = read_line(src)?;
                Ok(Message::SimpleError(line_to_string(line)?))
            }
            b':' => {
                let line = read_line(src)?;
                Ok(Message::Integer(parse_integer(line)?))
            }
            // $<length>\r\n<data>\r\n, or $-1\r\n for the null bulk string.
            b'$' => {
                let length = parse_integer(read_line(src)?)?;
                if length == -1 {
                    return Ok(Message::NullBulkString);
                }
                let length = usize::try_from(length).map_err(|_| {
                    RespError::BadFrame(format!("invalid bulk string length {length}"))
                })?;
                let payload = Bytes::copy_from_slice(read_exact(src, length)?);
                expect_terminator(src)?;
                Ok(Message::BulkString(payload))
            }
            // *<count>\r\n<element-1>...<element-n>. A count of -1 is the
            // null array, which this server folds into the empty array.
            b'*' => {
                let count = parse_integer(read_line(src)?)?;
                if count == -1 {
                    return Ok(Message::Array(Vec::new()));
                }
                let count = usize::try_from(count)
                    .map_err(|_| RespError::BadFrame(format!("invalid array count {count}")))?;

                let mut elements = Vec::with_capacity(count.min(64));
                for _ in 0..count {
                    let element = Message::decode(src)?;
                    if matches!(element, Message::Array(_)) {
                        return Err(RespError::BadFrame(
                            "nested arrays are not supported".to_string(),
                        ));
                    }
                    elements.push(element);
                }
                Ok(Message::Array(elements))
            }
            other => Err(RespError::BadType(other)),
        }
    }

    /// Decodes a buffer that must hold exactly one complete message.
    ///
    /// Trailing bytes after the frame are rejected with
    /// [`RespError::BadFrame`].
    pub fn from_bytes(buffer: &[u8]) -> Result<Message, RespError> {
        let mut src = Cursor::new(buffer);
        let message = Message::decode(&mut src)?;
        if src.has_remaining() {
            return Err(RespError::BadFrame(format!(
                "{} trailing bytes after frame",
                src.remaining()
            )));
        }
        Ok(message)
    }

    /// Serializes the message. The codec round-trips: for any buffer `B`
    /// produced by `encode`, decoding `B` yields the original message.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::SimpleString(text) => encode_line(b'+', text.as_bytes()),
            Message::SimpleError(text) => encode_line(b'-', text.as_bytes()),
            Message::Integer(value) => encode_line(b':', value.to_string().as_bytes()),
            Message::BulkString(payload) => {
                let length = payload.len().to_string();
                let mut out = Vec::with_capacity(1 + length.len() + 2 + payload.len() + 2);
                out.push(b'$');
                out.extend_from_slice(length.as_bytes());
                out.extend_from_slice(TERMINATOR);
                out.extend_from_slice(payload);
                out.extend_from_slice(TERMINATOR);
                out
            }
            Message::NullBulkString => b"$-1\r\n".to_vec(),
            Message::Array(elements) => {
                let mut out = encode_line(b'*', elements.len().to_string().as_bytes());
                for element in elements {
                    out.extend_from_slice(&element.encode());
                }
                out
            }
        }
    }
}

fn encode_line(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len() + 2);
    out.push(tag);
    out.extend_from_slice(payload);
    out.extend_from_slice(TERMINATOR);
    out
}

fn read_byte(src: &mut Cursor<&[u8]>) -> Result<u8, RespError> {
    if !src.has_remaining() {
        return Err(RespError::ShortRead);
    }
    Ok(src.get_u8())
}

/// Returns the bytes up to the next terminator and advances past it.
fn read_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], RespError> {
    let buffer = *src.get_ref();
    let start = src.position() as usize;

    let end = buffer[start..]
        .windows(TERMINATOR.len())
        .position(|window| window == TERMINATOR)
        .map(|offset| start + offset)
        .ok_or(RespError::ShortRead)?;

    src.set_position((end + TERMINATOR.len()) as u64);
    Ok(&buffer[start..end])
}

fn read_exact<'a>(src: &mut Cursor<&'a [u8]>, length: usize) -> Result<&'a [u8], RespError> {
    let buffer = *src.get_ref();
    let start = src.position() as usize;

    if buffer.len() - start < length {
        return Err(RespError::ShortRead);
    }
    src.set_position((start + length) as u64);
    Ok(&buffer[start..start + length])
}

fn expect_terminator(src: &mut Cursor<&[u8]>) -> Result<(), RespError> {
    let bytes = read_exact(src, TERMINATOR.len())?;
    if bytes != TERMINATOR {
        return Err(RespError::BadFrame(
            "bulk string payload not followed by CRLF".to_string(),
        ));
    }
    Ok(())
}

fn line_to_string(line: &[u8]) -> Result<String, RespError> {
    String::from_utf8(line.to_vec())
        .map_err(|_| RespError::BadFrame("invalid UTF-8 in simple string".to_string()))
}

fn parse_integer(line: &[u8]) -> Result<i64, RespError> {
    let text = std::str::from_utf8(line)
        .map_err(|_| RespError::BadFrame("invalid UTF-8 in integer".to_string()))?;
    text.parse::<i64>()
        .map_err(|_| RespError::BadFrame(format!("invalid integer: {text:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(text: &str) -> Message {
        Message::BulkString(Bytes::copy_from_slice(text.as_bytes()))
    }

    #[test]
    fn test_decode_messages() {
        let test_cases: Vec<(&[u8], Message)> = vec![
            (b"+OK\r\n", Message::SimpleString("OK".to_string())),
            (b"+\r\n", Message::SimpleString(String::new())),
            (
                b"-ERR unknown command\r\n",
                Message::SimpleError("ERR unknown command".to_string()),
            ),
            (b":1000\r\n", Message::Integer(1000)),
            (b":-42\r\n", Message::Integer(-42)),
            (b":0\r\n", Message::Integer(0)),
            (b"$6\r\nfoobar\r\n", bulk("foobar")),
            (b"$0\r\n\r\n", bulk("")),
            (b"$-1\r\n", Message::NullBulkString),
            (b"*0\r\n", Message::Array(Vec::new())),
            (b"*-1\r\n", Message::Array(Vec::new())),
            (
                b"*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n",
                Message::Array(vec![bulk("ECHO"), bulk("hi")]),
            ),
            (
                b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n",
                Message::Array(vec![bulk("SET"), bulk("foo"), bulk("bar")]),
            ),
            (
                b"*2\r\n:1\r\n+yes\r\n",
                Message::Array(vec![
                    Message::Integer(1),
                    Message::SimpleString("yes".to_string()),
                ]),
            ),
        ];

        for (input, expected) in test_cases {
            assert_eq!(
                Message::from_bytes(input),
                Ok(expected),
                "decoding {:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_decode_errors() {
        let test_cases: Vec<(&[u8], RespError)> = vec![
            (b"", RespError::ShortRead),
            (b"+OK", RespError::ShortRead),
            (b"$6\r\nfoo", RespError::ShortRead),
            (b"*2\r\n$4\r\nECHO\r\n", RespError::ShortRead),
            (b"%2\r\n", RespError::BadType(b'%')),
            (b"hello\r\n", RespError::BadType(b'h')),
            (
                b":ten\r\n",
                RespError::BadFrame("invalid integer: \"ten\"".to_string()),
            ),
            (
                b"$3\r\nfooXY",
                RespError::BadFrame("bulk string payload not followed by CRLF".to_string()),
            ),
            (
                b"*1\r\n*1\r\n$2\r\nhi\r\n",
                RespError::BadFrame("nested arrays are not supported".to_string()),
            ),
        ];

        for (input, expected) in test_cases {
            assert_eq!(
                Message::from_bytes(input),
                Err(expected),
                "decoding {:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_from_bytes_rejects_trailing_bytes() {
        let result = Message::from_bytes(b"+PONG\r\n+PONG\r\n");
        assert_eq!(
            result,
            Err(RespError::BadFrame("7 trailing bytes after frame".to_string()))
        );
    }

    #[test]
    fn test_empty_bulk_string_is_not_null() {
        let empty = Message::from_bytes(b"$0\r\n\r\n").unwrap();
        let null = Message::from_bytes(b"$-1\r\n").unwrap();

        assert_eq!(empty, bulk(""));
        assert_eq!(null, Message::NullBulkString);
        assert_ne!(empty, null);
    }

    #[test]
    fn test_encode_messages() {
        let test_cases: Vec<(Message, &[u8])> = vec![
            (Message::SimpleString("PONG".to_string()), b"+PONG\r\n"),
            (
                Message::SimpleError("ERR unknown command".to_string()),
                b"-ERR unknown command\r\n",
            ),
            (Message::Integer(-7), b":-7\r\n"),
            (bulk("hello"), b"$5\r\nhello\r\n"),
            (bulk(""), b"$0\r\n\r\n"),
            (Message::NullBulkString, b"$-1\r\n"),
            (Message::Array(Vec::new()), b"*0\r\n"),
            (
                Message::Array(vec![bulk("dir"), bulk("/tmp")]),
                b"*2\r\n$3\r\ndir\r\n$4\r\n/tmp\r\n",
            ),
        ];

        for (message, expected) in test_cases {
            assert_eq!(message.encode(), expected, "encoding {message:?}");
        }
    }

    #[test]
    fn test_round_trip() {
        let buffers: Vec<&[u8]> = vec![
            b"+PONG\r\n",
            b"-ERR oops\r\n",
            b":1234\r\n",
            b"$5\r\nhello\r\n",
            b"$0\r\n\r\n",
            b"$-1\r\n",
            b"*0\r\n",
            b"*2\r\n$4\r\nPING\r\n$5\r\nhello\r\n",
            b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n",
        ];

        for buffer in buffers {
            let message = Message::from_bytes(buffer).unwrap();
            assert_eq!(
                message.encode(),
                buffer,
                "round-tripping {:?}",
                String::from_utf8_lossy(buffer)
            );
        }
    }

    #[test]
    fn test_decode_leaves_cursor_after_frame() {
        let buffer: &[u8] = b"+PONG\r\n$2\r\nhi\r\n";
        let mut src = Cursor::new(buffer);

        let first = Message::decode(&mut src).unwrap();
        assert_eq!(first, Message::SimpleString("PONG".to_string()));
        assert_eq!(src.position(), 7);

        let second = Message::decode(&mut src).unwrap();
        assert_eq!(second, bulk("hi"));
        assert_eq!(src.position() as usize, buffer.len());
    }
}
