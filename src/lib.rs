//! A tiny interactive command interpreter.
//!
//! `shh` reads one line at a time, splits it on whitespace, and either runs one of
//! its three built-ins (`cd`, `help`, `exit`) in-process or launches the named
//! program and waits for it to finish. There are no pipes, redirections, quoting
//! rules or variables: a line is just a program name followed by its arguments.
//!
//! The main entry point is [`Interpreter`]. The public modules expose the pieces
//! it is built from so they can be reused or replaced: [`lexer`] for tokenizing,
//! [`reader`] for obtaining lines, [`command`] for the command traits and
//! [`env`] for the environment handed to child processes.

mod builtin;
pub mod command;
pub mod env;
mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod reader;

pub use builtin::BUILTIN_NAMES;
pub use command::Continuation;
pub use external::LaunchError;
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;

/// Name used to prefix every diagnostic written to the error stream.
pub const PROGRAM_NAME: &str = "shh";
