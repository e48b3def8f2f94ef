//! Client command validation and response generation.
//!
//! A decoded [`crate::resp::Message`] is classified into a [`Command`] whose
//! arguments have already been shape-checked; executing the command applies
//! any cache mutation and produces the reply message. Requests that do not
//! validate into a command fall back to a lenient `OK` reply.

mod config_get;
mod dispatcher;
mod echo;
mod get;
mod keys;
mod ping;
mod set;

pub use config_get::ConfigGetArguments;
pub use dispatcher::{dispatch, Command};
pub use echo::EchoArguments;
pub use get::GetArguments;
pub use keys::KeysArguments;
pub use ping::PingArguments;
pub use set::SetArguments;
