use std::time::Duration;

use bytes::Bytes;

use crate::cache::Cache;
use crate::resp::Message;

/// Arguments to the SET command: a key, a value and an optional PX expiry.
///
/// The only recognized option is `px <milliseconds>`; the option name is
/// matched case-insensitively and the duration must be a non-negative
/// integer.
#[derive(Debug, PartialEq)]
pub struct SetArguments {
    pub key: Bytes,
    pub value: Bytes,
    pub ttl: Option<Duration>,
}

impl SetArguments {
    pub fn parse(arguments: &[Bytes]) -> Option<Self> {
        match arguments {
            [key, value] => Some(Self {
                key: key.clone(),
                value: value.clone(),
                ttl: None,
            }),
            [key, value, option, milliseconds] => {
                if !option.eq_ignore_ascii_case(b"px") {
                    return None;
                }
                let milliseconds = std::str::from_utf8(milliseconds)
                    .ok()?
                    .parse::<u64>()
                    .ok()?;
                Some(Self {
                    key: key.clone(),
                    value: value.clone(),
                    ttl: Some(Duration::from_millis(milliseconds)),
                })
            }
            _ => None,
        }
    }
}

/// Writes the entry, replacing any previous value and expiry, then replies
/// `OK`.
pub async fn set(cache: &Cache, arguments: SetArguments) -> Message {
    cache
        .set(arguments.key, arguments.value, arguments.ttl)
        .await;
    Message::SimpleString("OK".to_string())
}
