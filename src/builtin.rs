use crate::PROGRAM_NAME;
use crate::command::{CommandFactory, Continuation, ExecutableCommand, OutputStream};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result, bail};
use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Names of the built-in commands, in lookup order.
pub const BUILTIN_NAMES: [&str; 3] = ["cd", "help", "exit"];

/// Built-in commands known to the interpreter at compile time.
///
/// Builtins receive their argument tokens verbatim, so a token starting with `-`
/// is an ordinary argument. They run in-process without spawning a child.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "cd" or "exit".
    fn name() -> &'static str;

    /// Builds the command from the tokens following its name.
    fn parse(args: &[&str]) -> Self;

    /// Executes the command, writing any regular output to `stdout`.
    ///
    /// Failures are returned rather than printed; the dispatcher reports them.
    fn execute<W: Write + ?Sized>(
        self,
        stdout: &mut W,
        env: &mut Environment,
    ) -> Result<Continuation>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn OutputStream,
        _stderr: &mut dyn OutputStream,
        env: &mut Environment,
    ) -> Result<Continuation> {
        <T as BuiltinCommand>::execute(*self, stdout, env)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        (name == T::name()).then(|| Box::new(T::parse(args)) as Box<dyn ExecutableCommand>)
    }
}

/// Factories for every built-in, in the order of [`BUILTIN_NAMES`].
pub(crate) fn builtin_factories() -> Vec<Box<dyn CommandFactory>> {
    vec![
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Help>::default()),
        Box::new(Factory::<Exit>::default()),
    ]
}

/// Change the working directory of the interpreter and of every program it launches.
///
/// The target is the first argument, absolute or relative to the current
/// directory. Further arguments are ignored.
pub struct Cd {
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn parse(args: &[&str]) -> Self {
        Cd {
            target: args.first().map(|arg| arg.to_string()),
        }
    }

    fn execute<W: Write + ?Sized>(
        self,
        _stdout: &mut W,
        env: &mut Environment,
    ) -> Result<Continuation> {
        let Some(target) = self.target else {
            bail!("expected argument to \"cd\"");
        };

        // An absolute target replaces the base entirely.
        let new_dir = env.current_dir.join(Path::new(&target));

        let canonical = fs::canonicalize(&new_dir).with_context(|| format!("cd: {target}"))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(Continuation::Continue)
    }
}

/// List the built-in commands. Arguments are ignored.
pub struct Help;

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn parse(_args: &[&str]) -> Self {
        Help
    }

    fn execute<W: Write + ?Sized>(
        self,
        stdout: &mut W,
        _env: &mut Environment,
    ) -> Result<Continuation> {
        writeln!(stdout, "{PROGRAM_NAME}: a minimal command interpreter")?;
        writeln!(stdout, "Type program names and arguments, and hit enter.")?;
        writeln!(stdout, "The following are built in:")?;
        for name in BUILTIN_NAMES {
            writeln!(stdout, "    {name}")?;
        }
        writeln!(stdout, "Use the man command for information on other programs.")?;
        Ok(Continuation::Continue)
    }
}

/// Leave the interpreter. Arguments are ignored.
pub struct Exit;

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn parse(_args: &[&str]) -> Self {
        Exit
    }

    fn execute<W: Write + ?Sized>(
        self,
        _stdout: &mut W,
        _env: &mut Environment,
    ) -> Result<Continuation> {
        Ok(Continuation::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemWriter;
    use crate::test_support::preserve_current_dir;
    use std::collections::HashMap;
    use std::env as stdenv;

    /// Environment rooted in the temp directory, independent of the process cwd.
    fn test_env() -> Environment {
        Environment {
            vars: HashMap::new(),
            current_dir: stdenv::temp_dir(),
        }
    }

    fn cd(args: &[&str]) -> Cd {
        Cd::parse(args)
    }

    /// Runs a command created through the factory table, returning its signal,
    /// stdout and stderr.
    fn run_via_factory(name: &str, args: &[&str]) -> (Continuation, String, String) {
        run_in(&mut test_env(), name, args)
    }

    fn run_in(
        env: &mut Environment,
        name: &str,
        args: &[&str],
    ) -> (Continuation, String, String) {
        let cmd = builtin_factories()
            .iter()
            .find_map(|f| f.try_create(&*env, name, args))
            .expect("builtin should be recognized");
        let (mut out, out_buf) = MemWriter::with_handle();
        let (mut err, err_buf) = MemWriter::with_handle();
        let signal = cmd.execute(&mut out, &mut err, env).unwrap();
        let out = String::from_utf8(out_buf.borrow().clone()).unwrap();
        let err = String::from_utf8(err_buf.borrow().clone()).unwrap();
        (signal, out, err)
    }

    #[test]
    fn test_names_follow_table_order() {
        assert_eq!(BUILTIN_NAMES, [Cd::name(), Help::name(), Exit::name()]);
    }

    #[test]
    fn test_cd_without_target_is_usage_error() {
        let _cwd = preserve_current_dir();
        let before = stdenv::current_dir().unwrap();
        let mut env = test_env();
        let env_before = env.current_dir.clone();

        let err = cd(&[]).execute(&mut Vec::new(), &mut env).unwrap_err();

        assert_eq!(err.to_string(), "expected argument to \"cd\"");
        assert_eq!(stdenv::current_dir().unwrap(), before);
        assert_eq!(env.current_dir, env_before);
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(temp.path()).expect("canonicalize failed");
        let _cwd = preserve_current_dir();
        let mut env = test_env();

        let target = canonical_temp.to_string_lossy().to_string();
        let res = cd(&[&target]).execute(&mut Vec::new(), &mut env);

        assert_eq!(res.unwrap(), Continuation::Continue);
        let new_cwd = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        assert_eq!(new_cwd, canonical_temp);
        assert_eq!(env.current_dir, canonical_temp);
    }

    #[test]
    fn test_cd_relative_to_current_dir() {
        let temp = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(temp.path()).unwrap();
        fs::create_dir(base.join("inner")).unwrap();
        let _cwd = preserve_current_dir();
        let mut env = test_env();
        env.current_dir = base.clone();

        cd(&["inner"]).execute(&mut Vec::new(), &mut env).unwrap();
        assert_eq!(env.current_dir, base.join("inner"));

        cd(&[".."]).execute(&mut Vec::new(), &mut env).unwrap();
        assert_eq!(env.current_dir, base);
    }

    #[test]
    fn test_cd_ignores_extra_arguments() {
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();
        let _cwd = preserve_current_dir();
        let mut env = test_env();

        let target = canonical_temp.to_string_lossy().to_string();
        cd(&[&target, "extra", "more"])
            .execute(&mut Vec::new(), &mut env)
            .unwrap();

        assert_eq!(env.current_dir, canonical_temp);
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _cwd = preserve_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut env = test_env();
        let env_before = env.current_dir.clone();

        let name = format!("nonexistent_dir_for_shh_test_{}", std::process::id());
        let err = cd(&[&name]).execute(&mut Vec::new(), &mut env).unwrap_err();

        assert!(format!("{err:#}").starts_with(&format!("cd: {name}: ")));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
        assert_eq!(env.current_dir, env_before);
    }

    #[test]
    fn test_cd_into_file_errors() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("plain_file");
        fs::write(&file, "x").unwrap();
        let _cwd = preserve_current_dir();
        let mut env = test_env();
        let env_before = env.current_dir.clone();

        let target = file.to_string_lossy().to_string();
        let res = cd(&[&target]).execute(&mut Vec::new(), &mut env);

        assert!(res.is_err());
        assert_eq!(env.current_dir, env_before);
    }

    #[test]
    fn test_help_lists_builtins_in_order() {
        let mut out = Vec::new();
        let res = Help.execute(&mut out, &mut test_env());

        assert_eq!(res.unwrap(), Continuation::Continue);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "shh: a minimal command interpreter\n\
             Type program names and arguments, and hit enter.\n\
             The following are built in:\n    cd\n    help\n    exit\n\
             Use the man command for information on other programs.\n"
        );
    }

    #[test]
    fn test_exit_stops() {
        let res = Exit.execute(&mut Vec::new(), &mut test_env());
        assert_eq!(res.unwrap(), Continuation::Stop);
    }

    #[test]
    fn test_exit_ignores_any_arguments() {
        let cases: [&[&str]; 4] = [&[], &["0"], &["-5", "--bogus"], &["--help"]];
        for args in cases {
            let (signal, out, err) = run_via_factory("exit", args);
            assert_eq!(signal, Continuation::Stop, "args {args:?}");
            assert!(out.is_empty() && err.is_empty());
        }
    }

    #[test]
    fn test_factory_ignores_other_names() {
        let env = test_env();
        for name in ["CD", "Help", "exit2", "ls", ""] {
            assert!(
                builtin_factories()
                    .iter()
                    .all(|f| f.try_create(&env, name, &[]).is_none())
            );
        }
    }

    #[test]
    fn test_help_via_factory_ignores_arguments() {
        let (signal, out, err) = run_via_factory("help", &["cd", "more"]);
        assert_eq!(signal, Continuation::Continue);
        assert!(out.contains("    cd\n    help\n    exit\n"));
        assert!(err.is_empty());
    }

    #[test]
    fn test_help_ignores_option_like_arguments() {
        let cases: [&[&str]; 3] = [&["-v"], &["--bogus"], &["--help", "cd"]];
        for args in cases {
            let (signal, out, err) = run_via_factory("help", args);
            assert_eq!(signal, Continuation::Continue);
            assert!(
                out.starts_with("shh: a minimal command interpreter\n"),
                "args {args:?}: {out}"
            );
            assert!(err.is_empty(), "args {args:?}: {err}");
        }
    }

    #[test]
    fn test_cd_into_directory_named_like_an_option() {
        let temp = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(temp.path()).unwrap();
        fs::create_dir(base.join("-stuff")).unwrap();
        let _cwd = preserve_current_dir();
        let mut env = test_env();
        env.current_dir = base.clone();

        let (signal, out, err) = run_in(&mut env, "cd", &["-stuff"]);

        assert_eq!(signal, Continuation::Continue);
        assert!(out.is_empty() && err.is_empty(), "{out}{err}");
        assert_eq!(env.current_dir, base.join("-stuff"));
        assert_eq!(stdenv::current_dir().unwrap(), base.join("-stuff"));
    }

    #[test]
    fn test_cd_help_is_a_directory_name() {
        let temp = tempfile::tempdir().unwrap();
        let _cwd = preserve_current_dir();
        let mut env = test_env();
        env.current_dir = temp.path().to_path_buf();

        let err = cd(&["--help"]).execute(&mut Vec::new(), &mut env).unwrap_err();

        assert!(format!("{err:#}").starts_with("cd: --help: "), "{err:#}");
        assert_eq!(env.current_dir, temp.path());
    }
}
