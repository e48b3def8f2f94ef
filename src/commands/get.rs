use bytes::Bytes;

use crate::cache::Cache;
use crate::resp::Message;

/// Arguments to the GET command: the key to look up.
#[derive(Debug, PartialEq)]
pub struct GetArguments {
    pub key: Bytes,
}

impl GetArguments {
    pub fn parse(arguments: &[Bytes]) -> Option<Self> {
        match arguments {
            [key] => Some(Self { key: key.clone() }),
            _ => None,
        }
    }
}

/// Replies the stored value as a bulk string, or the null bulk string when
/// the key is absent or its entry has expired.
pub async fn get(cache: &Cache, arguments: GetArguments) -> Message {
    match cache.get(&arguments.key).await {
        Some(value) => Message::BulkString(value),
        None => Message::NullBulkString,
    }
}
