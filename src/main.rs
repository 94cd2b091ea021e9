use argh::FromArgs;
use shh::reader::{EditorReader, LineReader, StreamReader};
use shh::{Interpreter, PROGRAM_NAME};
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A minimal interactive command interpreter.
struct Options {
    #[argh(option, default = "String::from(\"> \")")]
    /// text shown before each command line.
    prompt: String,

    #[argh(switch)]
    /// read plain lines from standard input, without line editing.
    no_edit: bool,
}

fn line_reader(options: &Options) -> Box<dyn LineReader> {
    if options.no_edit || !io::stdin().is_terminal() {
        return Box::new(StreamReader::stdin());
    }
    match EditorReader::new() {
        Ok(editor) => Box::new(editor),
        Err(err) => {
            warn!("{err:#}; falling back to plain input");
            Box::new(StreamReader::stdin())
        }
    }
}

fn main() -> ExitCode {
    // RUST_LOG=debug shows dispatch decisions and child exit statuses.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let options: Options = argh::from_env();
    let mut reader = line_reader(&options);

    match Interpreter::default().repl(&mut *reader, &options.prompt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{PROGRAM_NAME}: {err:#}");
            ExitCode::FAILURE
        }
    }
}
