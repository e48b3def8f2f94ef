//! Per-connection request/response loop.
//!
//! Each accepted socket runs `receive -> decode -> dispatch -> encode ->
//! send` in series until the peer half-closes or an error ends the
//! connection. Commands on one connection are processed in arrival order;
//! there is no cross-connection ordering.

use std::io::Cursor;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::cache::Cache;
use crate::commands::dispatch;
use crate::config::Config;
use crate::resp::{Message, RespError};

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Resp(#[from] RespError),
}

/// A client socket plus the bytes read from it but not yet parsed.
///
/// Data is read from the socket into the buffer; once a complete frame is
/// parsed, its bytes are dropped from the front. Partial frames stay
/// buffered until the rest arrives, so a message may span any number of
/// reads.
pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Reads one complete message.
    ///
    /// Returns `Ok(None)` on a clean disconnect: the peer half-closed and no
    /// buffered bytes remain. A disconnect that leaves the beginning of a
    /// frame behind is an error.
    pub async fn read_message(&mut self) -> Result<Option<Message>, ConnectionError> {
        loop {
            if let Some(message) = self.parse_buffered_message()? {
                return Ok(Some(message));
            }

            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(ConnectionError::Resp(RespError::ShortRead));
            }
        }
    }

    /// Attempts to parse a frame out of the buffer, consuming its bytes on
    /// success. `Ok(None)` means the buffer holds less than one frame.
    fn parse_buffered_message(&mut self) -> Result<Option<Message>, ConnectionError> {
        let mut src = Cursor::new(&self.buffer[..]);

        match Message::decode(&mut src) {
            Ok(message) => {
                let consumed = src.position() as usize;
                self.buffer.advance(consumed);
                Ok(Some(message))
            }
            Err(RespError::ShortRead) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    pub async fn write_message(&mut self, message: &Message) -> Result<(), ConnectionError> {
        self.stream.write_all(&message.encode()).await?;
        self.stream.flush().await?;
        Ok(())
    }
}

/// Serves one client until it disconnects.
///
/// Decode errors and socket errors terminate this connection only; the
/// caller logs them. The socket is released on exit.
pub async fn handle_connection(
    stream: TcpStream,
    cache: Arc<Cache>,
    config: Arc<Config>,
) -> Result<(), ConnectionError> {
    let mut connection = Connection::new(stream);

    while let Some(message) = connection.read_message().await? {
        debug!(request = ?message, "received request");
        let response = dispatch(&message, &cache, &config).await;
        debug!(?response, "sending response");
        connection.write_message(&response).await?;
    }

    Ok(())
}
