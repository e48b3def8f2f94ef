use bytes::Bytes;

use crate::resp::Message;

/// Arguments to the ECHO command: exactly one message.
#[derive(Debug, PartialEq)]
pub struct EchoArguments {
    pub message: Bytes,
}

impl EchoArguments {
    pub fn parse(arguments: &[Bytes]) -> Option<Self> {
        match arguments {
            [message] => Some(Self {
                message: message.clone(),
            }),
            _ => None,
        }
    }
}

/// Replies the argument back as a bulk string.
pub fn echo(arguments: EchoArguments) -> Message {
    Message::BulkString(arguments.message)
}
