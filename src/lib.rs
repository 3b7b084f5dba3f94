//! A small interactive shell.
//!
//! Lines are split into tokens by [`lexer`], checked for control markers (`&`, `>`,
//! `>>`, `>>>`) by [`parser`], resolved against the alias table and the search path
//! by [`resolver`] and finally carried out by [`dispatch`]. The [`Interpreter`] ties
//! these stages together around a [`Session`] and provides the prompt loop.
//!
//! The only builtins are `exit`, `alias` and the `bello` report; everything else is
//! an external program.

pub mod alias;
mod builtin;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod external;
mod interpreter;
mod io_adapters;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod session;

pub use config::Config;
pub use dispatch::Outcome;
pub use env::Environment;
pub use error::{Result, ShellError};
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
pub use session::Session;
