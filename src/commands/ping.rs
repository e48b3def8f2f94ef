use bytes::Bytes;

use crate::resp::Message;

/// Arguments to the PING command: an optional message to echo back.
///
/// PING is the one command accepted both as an array and as a bare string
/// message; in the bare form it never carries an argument.
#[derive(Debug, PartialEq)]
pub struct PingArguments {
    pub message: Option<Bytes>,
}

impl PingArguments {
    /// Accepts zero arguments or exactly one.
    ///
    /// # Examples
    ///
    /// ```
    /// use rudis::commands::PingArguments;
    ///
    /// assert!(PingArguments::parse(&[]).is_some());
    /// assert!(PingArguments::parse(&["hello".into()]).is_some());
    /// assert!(PingArguments::parse(&["a".into(), "b".into()]).is_none());
    /// ```
    pub fn parse(arguments: &[Bytes]) -> Option<Self> {
        match arguments {
            [] => Some(Self { message: None }),
            [message] => Some(Self {
                message: Some(message.clone()),
            }),
            _ => None,
        }
    }
}

/// Replies `PONG` to a bare PING, or echoes the argument as a bulk string.
pub fn ping(arguments: PingArguments) -> Message {
    match arguments.message {
        Some(message) => Message::BulkString(message),
        None => Message::SimpleString("PONG".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_without_argument_replies_pong() {
        let response = ping(PingArguments { message: None });
        assert_eq!(response, Message::SimpleString("PONG".to_string()));
    }

    #[test]
    fn test_ping_with_argument_echoes_it() {
        let response = ping(PingArguments {
            message: Some(Bytes::from_static(b"hello")),
        });
        assert_eq!(response, Message::BulkString(Bytes::from_static(b"hello")));
    }
}
