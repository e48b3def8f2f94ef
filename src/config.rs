//! Server configuration and command-line parsing.

use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_PORT: u16 = 6379;

/// Errors that can occur while parsing command-line arguments.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum CliError {
    #[error("unknown command line flag: {0}")]
    UnknownFlag(String),
    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),
    #[error("invalid port flag value")]
    InvalidPortFlagValue,
    #[error("--dir and --dbfilename must be specified together")]
    IncompleteSnapshotLocation,
}

/// Runtime configuration, read-only after construction.
///
/// `dir` and `dbfilename` locate the RDB snapshot to seed the cache from;
/// either both are present or neither is. With `strict_errors` set,
/// unrecognized commands receive a typed error reply instead of the default
/// lenient `OK`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub dir: Option<String>,
    pub dbfilename: Option<String>,
    pub strict_errors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            dir: None,
            dbfilename: None,
            strict_errors: false,
        }
    }
}

impl Config {
    /// Parses command-line arguments (typically `std::env::args()`).
    ///
    /// # Supported flags
    ///
    /// * `--port <port>` - port to listen on (default: 6379)
    /// * `--dir <path>` - directory containing the RDB snapshot
    /// * `--dbfilename <name>` - basename of the RDB snapshot
    /// * `--strict-errors` - reply with an error to unrecognized commands
    ///
    /// `--dir` and `--dbfilename` are each optional, but giving one without
    /// the other is an error.
    pub fn from_args<I: IntoIterator<Item = String>>(command_line_args: I) -> Result<Self, CliError> {
        let mut iter = command_line_args.into_iter().skip(1);
        let mut config = Config::default();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--port" => {
                    let Some(value) = iter.next() else {
                        return Err(CliError::MissingFlagValue(arg));
                    };
                    config.port = validate_port_flag(&value)?;
                }
                "--dir" => {
                    let Some(value) = iter.next() else {
                        return Err(CliError::MissingFlagValue(arg));
                    };
                    config.dir = Some(value);
                }
                "--dbfilename" => {
                    let Some(value) = iter.next() else {
                        return Err(CliError::MissingFlagValue(arg));
                    };
                    config.dbfilename = Some(value);
                }
                "--strict-errors" => {
                    config.strict_errors = true;
                }
                _ => return Err(CliError::UnknownFlag(arg)),
            }
        }

        if config.dir.is_some() != config.dbfilename.is_some() {
            return Err(CliError::IncompleteSnapshotLocation);
        }

        Ok(config)
    }

    /// Path of the RDB snapshot; present only when both flags were given.
    pub fn rdb_path(&self) -> Option<PathBuf> {
        match (&self.dir, &self.dbfilename) {
            (Some(dir), Some(dbfilename)) => Some(PathBuf::from(dir).join(dbfilename)),
            _ => None,
        }
    }
}

fn validate_port_flag(port: &str) -> Result<u16, CliError> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(CliError::InvalidPortFlagValue),
        Ok(port_number) => Ok(port_number),
    }
}
