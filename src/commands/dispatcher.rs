//! Classification of inbound messages and dispatch to command handlers.

use bytes::Bytes;
use tracing::error;

use crate::cache::Cache;
use crate::commands::config_get::{self, ConfigGetArguments};
use crate::commands::echo::{self, EchoArguments};
use crate::commands::get::{self, GetArguments};
use crate::commands::keys::{self, KeysArguments};
use crate::commands::ping::{self, PingArguments};
use crate::commands::set::{self, SetArguments};
use crate::config::Config;
use crate::resp::Message;

/// A validated client command.
///
/// The verb has been recognized and the arguments shape-checked; arguments
/// carry the raw byte payload of their source elements. Only the verb lookup
/// lowercases.
#[derive(Debug, PartialEq)]
pub enum Command {
    Ping(PingArguments),
    Echo(EchoArguments),
    Get(GetArguments),
    Set(SetArguments),
    ConfigGet(ConfigGetArguments),
    Keys(KeysArguments),
}

impl Command {
    /// Classifies a message into a command.
    ///
    /// The normal form is an array whose first element names the verb. A
    /// bare string message carries a verb with no arguments, a form only
    /// PING answers to. Anything else, an unknown verb, or an arity
    /// violation yields `None` and the caller's fallback applies.
    pub fn parse(message: &Message) -> Option<Command> {
        let (verb, arguments, is_array) = match message {
            Message::Array(elements) => {
                let verb = string_payload(elements.first()?)?;
                let arguments = elements[1..]
                    .iter()
                    .map(string_payload)
                    .collect::<Option<Vec<Bytes>>>()?;
                (verb, arguments, true)
            }
            Message::SimpleString(_) | Message::BulkString(_) => {
                (string_payload(message)?, Vec::new(), false)
            }
            _ => return None,
        };

        match verb.to_ascii_lowercase().as_slice() {
            b"ping" => PingArguments::parse(&arguments).map(Command::Ping),
            b"echo" if is_array => EchoArguments::parse(&arguments).map(Command::Echo),
            b"get" if is_array => GetArguments::parse(&arguments).map(Command::Get),
            b"set" if is_array => SetArguments::parse(&arguments).map(Command::Set),
            b"config" if is_array => ConfigGetArguments::parse(&arguments).map(Command::ConfigGet),
            b"keys" if is_array => KeysArguments::parse(&arguments).map(Command::Keys),
            _ => None,
        }
    }

    /// Applies the command's side effects and produces its reply.
    ///
    /// A SET lands in the cache before the response is constructed, so a GET
    /// issued after the SET reply was observed sees the write.
    pub async fn execute(self, cache: &Cache, config: &Config) -> Message {
        match self {
            Command::Ping(arguments) => ping::ping(arguments),
            Command::Echo(arguments) => echo::echo(arguments),
            Command::Get(arguments) => get::get(cache, arguments).await,
            Command::Set(arguments) => set::set(cache, arguments).await,
            Command::ConfigGet(arguments) => config_get::config_get(config, arguments),
            Command::Keys(arguments) => keys::keys(cache, arguments).await,
        }
    }
}

/// Validates and executes one request, producing the reply to send back.
///
/// Requests that do not classify into a command are logged and answered with
/// `OK`, or with an error reply when the server runs with `--strict-errors`.
pub async fn dispatch(message: &Message, cache: &Cache, config: &Config) -> Message {
    match Command::parse(message) {
        Some(command) => command.execute(cache, config).await,
        None => {
            error!(request = ?message, "could not parse a command from the request");
            if config.strict_errors {
                Message::SimpleError("ERR unknown command".to_string())
            } else {
                Message::SimpleString("OK".to_string())
            }
        }
    }
}

/// The raw byte payload of a string-typed element; `None` for anything else.
fn string_payload(message: &Message) -> Option<Bytes> {
    match message {
        Message::BulkString(payload) => Some(payload.clone()),
        Message::SimpleString(text) => Some(Bytes::copy_from_slice(text.as_bytes())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(text: &str) -> Message {
        Message::BulkString(Bytes::copy_from_slice(text.as_bytes()))
    }

    fn array(parts: &[&str]) -> Message {
        Message::Array(parts.iter().map(|part| bulk(part)).collect())
    }

    #[test]
    fn test_parse_recognizes_verbs_case_insensitively() {
        let test_cases = vec![
            array(&["PING"]),
            array(&["ping"]),
            array(&["PiNg"]),
            Message::SimpleString("PING".to_string()),
            bulk("ping"),
        ];

        for message in test_cases {
            assert!(
                matches!(Command::parse(&message), Some(Command::Ping(_))),
                "parsing {message:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_invalid_requests() {
        let test_cases = vec![
            // Unknown verbs.
            array(&["FLUSHALL"]),
            array(&["SUBSCRIBE", "news"]),
            Message::SimpleString("ECHO".to_string()),
            // Arity violations.
            array(&["ECHO"]),
            array(&["ECHO", "one", "two"]),
            array(&["GET"]),
            array(&["GET", "a", "b"]),
            array(&["SET", "key"]),
            array(&["SET", "key", "value", "px"]),
            array(&["SET", "key", "value", "ex", "100"]),
            array(&["SET", "key", "value", "px", "-1"]),
            array(&["SET", "key", "value", "px", "soon"]),
            array(&["CONFIG", "GET"]),
            array(&["CONFIG", "SET", "dir"]),
            array(&["PING", "a", "b"]),
            // Non-command messages.
            Message::Integer(5),
            Message::NullBulkString,
            Message::Array(vec![Message::Integer(1), bulk("two")]),
            Message::Array(vec![]),
        ];

        for message in test_cases {
            assert_eq!(Command::parse(&message), None, "parsing {message:?}");
        }
    }

    #[test]
    fn test_parse_keeps_argument_bytes_verbatim() {
        let message = array(&["SET", "Key", "VALUE"]);

        let Some(Command::Set(arguments)) = Command::parse(&message) else {
            panic!("expected a SET command");
        };
        assert_eq!(arguments.key, Bytes::from_static(b"Key"));
        assert_eq!(arguments.value, Bytes::from_static(b"VALUE"));
    }

    #[tokio::test]
    async fn test_dispatch_falls_back_to_ok() {
        let cache = Cache::new();
        let config = Config::default();

        let response = dispatch(&array(&["NOSUCH"]), &cache, &config).await;
        assert_eq!(response, Message::SimpleString("OK".to_string()));
    }

    #[tokio::test]
    async fn test_dispatch_strict_errors_reply() {
        let cache = Cache::new();
        let config = Config {
            strict_errors: true,
            ..Config::default()
        };

        let response = dispatch(&array(&["NOSUCH"]), &cache, &config).await;
        assert_eq!(
            response,
            Message::SimpleError("ERR unknown command".to_string())
        );
    }
}
