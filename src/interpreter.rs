use crate::PROGRAM_NAME;
use crate::builtin::builtin_factories;
use crate::command::{CommandFactory, Continuation, OutputStream};
use crate::env::Environment;
use crate::external::{ExternalCommand, LaunchError};
use crate::lexer;
use crate::reader::LineReader;
use std::io::{self, Write};
use tracing::{debug, trace};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: BuiltinCommand and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal interactive interpreter that can execute built-in and external commands.
///
/// The interpreter maintains an [`Environment`] and an ordered list of
/// [`CommandFactory`] objects that are queried, first match wins, to create
/// commands by name. See [`Default`] for the factories included out of the box.
///
/// Example
/// ```
/// use shh::{Continuation, Interpreter};
/// let mut sh = Interpreter::default();
/// assert_eq!(sh.execute(&[]), Continuation::Continue);
/// assert_eq!(sh.execute(&["exit", "now"]), Continuation::Stop);
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
    stdout: Box<dyn OutputStream>,
    stderr: Box<dyn OutputStream>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories, writing
    /// to the process's standard output and error.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Replace the streams used for command output and diagnostics.
    pub fn with_output(
        mut self,
        stdout: Box<dyn OutputStream>,
        stderr: Box<dyn OutputStream>,
    ) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Dispatch one tokenized command line.
    ///
    /// An empty token list is a no-op. Otherwise the first token selects the
    /// command and the whole list is handed to it. Any failure is reported on the
    /// error stream and the interpreter carries on, so only a command asking to
    /// stop (the `exit` built-in) yields [`Continuation::Stop`].
    pub fn execute(&mut self, tokens: &[&str]) -> Continuation {
        let Some((name, args)) = tokens.split_first() else {
            return Continuation::Continue;
        };

        let created = self
            .commands
            .iter()
            .find_map(|factory| factory.try_create(&self.env, name, args));
        let Some(cmd) = created else {
            self.report(&LaunchError::NotFound(name.to_string()).into());
            return Continuation::Continue;
        };

        debug!(command = name, args = args.len(), "dispatching");
        let signal = match cmd.execute(&mut *self.stdout, &mut *self.stderr, &mut self.env) {
            Ok(signal) => signal,
            Err(err) => {
                self.report(&err);
                Continuation::Continue
            }
        };
        let _ = self.stdout.flush();
        signal
    }

    /// Read, tokenize and dispatch loop.
    ///
    /// Shows `prompt` before every line and stops when a command returns
    /// [`Continuation::Stop`] or the reader runs out of input. Only a failure of
    /// the reader itself is returned as an error.
    pub fn repl(&mut self, reader: &mut dyn LineReader, prompt: &str) -> anyhow::Result<()> {
        while let Some(line) = reader.read_line(prompt)? {
            let tokens = lexer::split_into_tokens(&line);
            trace!(?tokens, "read line");
            if !self.execute(&tokens).should_continue() {
                debug!("exit requested");
                return Ok(());
            }
        }
        debug!("end of input");
        Ok(())
    }

    fn report(&mut self, err: &anyhow::Error) {
        debug!(error = %format!("{err:#}"), "command failed");
        let _ = writeln!(self.stderr, "{PROGRAM_NAME}: {err:#}");
        let _ = self.stderr.flush();
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `cd`, `help`, `exit`, in that order
    /// - external command launcher for every other name
    fn default() -> Self {
        let mut commands = builtin_factories();
        commands.push(Box::new(Factory::<ExternalCommand>::default()));
        Self::new(commands)
    }
}
