use crate::command::{CommandFactory, Continuation, ExecutableCommand, OutputStream};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::Result;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Search path used when `PATH` is not set, as `execvp` does.
pub const DEFAULT_SEARCH_PATH: &str = "/bin:/usr/bin";

/// Reasons a program could not be run to completion.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{0}: command not found")]
    NotFound(String),
    #[error("failed to execute {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed waiting for {program}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Command that is not a builtin.
pub struct ExternalCommand {
    name: String,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(name: String, args: Vec<String>) -> Self {
        Self { name, args }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    /// Accepts every name; resolution happens at launch so a missing program is
    /// reported like any other launch failure.
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        Some(Box::new(ExternalCommand::new(
            name.to_owned(),
            args.iter().map(|x| x.to_string()).collect(),
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    /// Runs the program and blocks until it exits or is killed by a signal.
    ///
    /// Its exit status is logged and otherwise ignored.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn OutputStream,
        stderr: &mut dyn OutputStream,
        env: &mut Environment,
    ) -> Result<Continuation> {
        let search_paths = env.get_var("PATH").unwrap_or(DEFAULT_SEARCH_PATH);
        let executable =
            find_command_path(OsStr::new(search_paths), Path::new(&self.name), &env.current_dir)
                .ok_or_else(|| LaunchError::NotFound(self.name.clone()))?;

        let mut command = Command::new(&*executable);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.arg0(&self.name);
        }

        let child_stdout = stdout.stdio();
        let child_stderr = stderr.stdio();
        let capture = child_stdout.is_none() || child_stderr.is_none();

        // The child sees exactly the snapshot, including removals.
        command
            .args(&self.args)
            .env_clear()
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .stdin(Stdio::inherit())
            .stdout(child_stdout.unwrap_or_else(Stdio::piped))
            .stderr(child_stderr.unwrap_or_else(Stdio::piped));

        let mut child = command.spawn().map_err(|source| LaunchError::Spawn {
            program: self.name.clone(),
            source,
        })?;
        debug!(pid = child.id(), program = %executable.display(), "spawned child");

        let wait_error = |source| LaunchError::Wait {
            program: self.name.clone(),
            source,
        };
        // Child::wait does not report stopped children, only exits and signals.
        let status = if capture {
            let output = child.wait_with_output().map_err(wait_error)?;
            stdout.write_all(&output.stdout)?;
            stderr.write_all(&output.stderr)?;
            output.status
        } else {
            child.wait().map_err(wait_error)?
        };
        debug!(program = %self.name, %status, "child finished");

        Ok(Continuation::Continue)
    }
}

/// Resolve a command path the way `execvp` would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative path with a separator (e.g., `bin/sh` or `./foo`): resolved against
///   `base` and returned if it exists.
/// - Single path component: searches each directory in `search_paths` (PATH) and
///   returns the first executable regular file. Relative PATH entries, including
///   the empty entry, are resolved against `base`.
/// - Empty path: returns `None`.
///
/// Existing files that turn out not to be executable are returned for explicit
/// paths so that launching them reports the permission error.
pub fn find_command_path<'a>(
    search_paths: &OsStr,
    path: &'a Path,
    base: &Path,
) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        // Empty path -> not found
        (None, None) => None,
        (Some(x), None) if !path.as_os_str().to_string_lossy().contains('/') => {
            find_in_path(search_paths, x.as_os_str(), base).map(Cow::Owned)
        }
        _ => {
            // Multiple components -> relative to the working directory
            let candidate = base.join(path);
            candidate.exists().then_some(Cow::Owned(candidate))
        }
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr, base: &Path) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| base.join(dir).join(cmd))
        .find(|candidate| is_executable(candidate))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
