use crate::env::Environment;
use anyhow::Result;
use std::io::{self, Write};
use std::process::Stdio;

/// Signal returned by every dispatched command.
///
/// The interactive loop asks for another line while commands return
/// [`Continuation::Continue`] and stops as soon as one returns [`Continuation::Stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Keep reading commands.
    Continue,
    /// Terminate the loop.
    Stop,
}

impl Continuation {
    pub fn should_continue(self) -> bool {
        self == Continuation::Continue
    }
}

/// Abstraction over a writable output stream that may also be handed to a
/// child process.
///
/// The interpreter writes built-in output and diagnostics through this trait and
/// passes the same streams to external programs.
pub trait OutputStream: Write {
    /// Handle a child process can write to directly.
    ///
    /// Returns `None` when the stream lives in this process only (for example an
    /// in-memory buffer); the child's output is then piped back and copied into
    /// the stream once the child has finished.
    fn stdio(&self) -> Option<Stdio>;
}

impl OutputStream for io::Stdout {
    fn stdio(&self) -> Option<Stdio> {
        Some(Stdio::inherit())
    }
}

impl OutputStream for io::Stderr {
    fn stdio(&self) -> Option<Stdio> {
        Some(Stdio::inherit())
    }
}

/// Object-safe trait for any command that can be executed by the interpreter.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command.
    ///
    /// Errors are reported by the caller; returning one never stops the loop.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn OutputStream,
        stderr: &mut dyn OutputStream,
        env: &mut Environment,
    ) -> Result<Continuation>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
