//! Sources of input lines for the interactive loop.

use anyhow::{Context, Result, anyhow};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, Write};

/// Something that can prompt for and return one line of input.
pub trait LineReader {
    /// Shows `prompt` and blocks until a line is available.
    ///
    /// The returned line never contains the trailing line terminator.
    /// `Ok(None)` means the input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Line editor for interactive terminals, backed by [`rustyline`].
///
/// Lines are never added to the editor's history.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|err| anyhow!("can't initialize line editor: {err}"))?;
        Ok(Self { editor })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            // Ctrl-C abandons the current line and shows a fresh prompt.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(anyhow!("can't read line: {err}")),
        }
    }
}

/// Reads lines from any buffered input, writing the prompt to `prompt_out`.
///
/// Used when the input is not a terminal (pipes, files) and in tests.
pub struct StreamReader<R, W> {
    input: R,
    prompt_out: W,
    buf: Vec<u8>,
}

impl<R: BufRead, W: Write> StreamReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self {
            input,
            prompt_out,
            buf: Vec::new(),
        }
    }

    /// Consume the reader, returning the prompt stream.
    pub fn into_prompt_out(self) -> W {
        self.prompt_out
    }
}

impl StreamReader<io::StdinLock<'static>, io::Stdout> {
    /// Reader over the process's standard input, prompting on standard output.
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LineReader for StreamReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompt_out
            .write_all(prompt.as_bytes())
            .and_then(|()| self.prompt_out.flush())
            .context("can't write prompt")?;

        self.buf.clear();
        let read = self
            .input
            .read_until(b'\n', &mut self.buf)
            .context("can't read line")?;
        if read == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}
