use bytes::Bytes;

use crate::cache::Cache;
use crate::resp::Message;

/// Arguments to the KEYS command.
///
/// The pattern argument is accepted but not applied: every key matches.
#[derive(Debug, PartialEq)]
pub struct KeysArguments {
    pub pattern: Option<Bytes>,
}

impl KeysArguments {
    pub fn parse(arguments: &[Bytes]) -> Option<Self> {
        Some(Self {
            pattern: arguments.first().cloned(),
        })
    }
}

/// Replies an array of bulk strings over the cache's current key snapshot,
/// in no particular order. Expired entries may appear until overwritten.
pub async fn keys(cache: &Cache, _arguments: KeysArguments) -> Message {
    let keys = cache
        .keys()
        .await
        .into_iter()
        .map(Message::BulkString)
        .collect();
    Message::Array(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(text: &str) -> Bytes {
        Bytes::copy_from_slice(text.as_bytes())
    }

    #[tokio::test]
    async fn test_keys_lists_every_stored_key() {
        let cache = Cache::new();
        cache.set(b("grape"), b("mango"), None).await;
        cache.set(b("banana"), b("pear"), None).await;

        let arguments = KeysArguments::parse(&[b("*")]).unwrap();
        let Message::Array(mut elements) = keys(&cache, arguments).await else {
            panic!("expected an array reply");
        };

        elements.sort_by_key(|element| match element {
            Message::BulkString(key) => key.clone(),
            _ => Bytes::new(),
        });
        assert_eq!(
            elements,
            vec![Message::BulkString(b("banana")), Message::BulkString(b("grape"))]
        );
    }

    #[tokio::test]
    async fn test_keys_ignores_the_pattern() {
        let cache = Cache::new();
        cache.set(b("grape"), b("mango"), None).await;

        let arguments = KeysArguments::parse(&[b("nomatch*")]).unwrap();
        assert_eq!(
            keys(&cache, arguments).await,
            Message::Array(vec![Message::BulkString(b("grape"))])
        );
    }

    #[tokio::test]
    async fn test_keys_on_an_empty_cache() {
        let cache = Cache::new();

        let arguments = KeysArguments::parse(&[]).unwrap();
        assert_eq!(keys(&cache, arguments).await, Message::Array(Vec::new()));
    }
}
