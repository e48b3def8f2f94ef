use bytes::Bytes;

use crate::config::Config;
use crate::resp::Message;

/// Arguments to CONFIG GET: the parameters named after the `get` sub-verb.
#[derive(Debug, PartialEq)]
pub struct ConfigGetArguments {
    pub parameters: Vec<Bytes>,
}

impl ConfigGetArguments {
    /// Requires the `get` sub-verb (case-insensitive) followed by at least
    /// one parameter name.
    pub fn parse(arguments: &[Bytes]) -> Option<Self> {
        let (sub_verb, parameters) = arguments.split_first()?;
        if !sub_verb.eq_ignore_ascii_case(b"get") || parameters.is_empty() {
            return None;
        }
        Some(Self {
            parameters: parameters.to_vec(),
        })
    }
}

/// Answers for the first parameter only.
///
/// `dir` and `dbfilename` are the recognized parameters, matched
/// case-insensitively. The reply is a two-element array of the parameter as
/// sent and its value, or an empty array when the parameter is unrecognized
/// or has no configured value.
pub fn config_get(config: &Config, arguments: ConfigGetArguments) -> Message {
    let parameter = &arguments.parameters[0];

    let value = match parameter.to_ascii_lowercase().as_slice() {
        b"dir" => config.dir.clone(),
        b"dbfilename" => config.dbfilename.clone(),
        _ => None,
    };

    match value {
        Some(value) => Message::Array(vec![
            Message::BulkString(parameter.clone()),
            Message::BulkString(Bytes::from(value)),
        ]),
        None => Message::Array(Vec::new()),
    }
}
