//! Line-oriented console access
//!
//! The console loop never touches stdin/stdout directly; everything goes
//! through a [`LineSource`]. Output is flushed on every call so a prompt is
//! always visible before the read that follows it.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// A prompt-aware, line-oriented console
pub trait LineSource {
    /// Read one line. Returns `Ok(None)` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Write text and flush.
    fn print(&mut self, text: &str) -> io::Result<()>;

    /// Write text followed by a newline, then flush.
    fn print_line(&mut self, text: &str) -> io::Result<()> {
        self.print(text)?;
        self.print("\n")
    }
}

/// Buffered reader/writer pair without line editing
///
/// A physical line ending in `\` is joined with the next one. With echo
/// enabled every line read is written back to the output.
pub struct PlainLineSource<R, W> {
    input: R,
    output: W,
    echo: bool,
}

impl PlainLineSource<io::BufReader<io::Stdin>, io::Stdout> {
    /// Console backed by the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> PlainLineSource<R, W> {
    /// Wrap an input and output stream
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            echo: false,
        }
    }

    /// Write each line back to the output after reading it
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Recover the wrapped streams
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn read_physical_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

impl<R: BufRead, W: Write> LineSource for PlainLineSource<R, W> {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if !prompt.is_empty() {
            self.print(prompt)?;
        }

        let Some(mut line) = self.read_physical_line()? else {
            return Ok(None);
        };

        while line.ends_with('\\') {
            line.pop();
            line.push('\n');
            match self.read_physical_line()? {
                Some(next) => line.push_str(&next),
                None => break,
            }
        }

        if self.echo {
            self.print_line(&line)?;
        }
        Ok(Some(line))
    }

    fn print(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }
}

/// Terminal console with line editing and history (rustyline)
pub struct EditorLineSource {
    editor: DefaultEditor,
    history_file: Option<PathBuf>,
}

impl EditorLineSource {
    /// Create an editor, loading history from `history_file` when it exists
    pub fn new(history_file: Option<PathBuf>) -> io::Result<Self> {
        let mut editor = DefaultEditor::new().map_err(readline_to_io)?;
        if let Some(path) = &history_file {
            if path.exists() {
                if let Err(err) = editor.load_history(path) {
                    tracing::warn!("Failed to load history from {:?}: {}", path, err);
                }
            }
        }
        Ok(Self {
            editor,
            history_file,
        })
    }
}

impl LineSource for EditorLineSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    // History is a convenience; failing to record it is not an I/O error.
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(readline_to_io(err)),
        }
    }

    fn print(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()
    }
}

impl Drop for EditorLineSource {
    fn drop(&mut self) {
        if let Some(path) = &self.history_file {
            if let Err(err) = self.editor.save_history(path) {
                tracing::warn!("Failed to save history to {:?}: {}", path, err);
            }
        }
    }
}

fn readline_to_io(err: ReadlineError) -> io::Error {
    match err {
        ReadlineError::Io(io_err) => io_err,
        other => io::Error::other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn source(input: &str) -> PlainLineSource<Cursor<Vec<u8>>, Vec<u8>> {
        PlainLineSource::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_reads_lines_then_eof() {
        let mut src = source("one\r\ntwo\n");
        assert_eq!(src.read_line("").unwrap().as_deref(), Some("one"));
        assert_eq!(src.read_line("").unwrap().as_deref(), Some("two"));
        assert_eq!(src.read_line("").unwrap(), None);
        assert_eq!(src.read_line("").unwrap(), None);
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut src = source("tail");
        assert_eq!(src.read_line("").unwrap().as_deref(), Some("tail"));
        assert_eq!(src.read_line("").unwrap(), None);
    }

    #[test]
    fn test_prompt_written_before_read() {
        let mut src = source("x\n");
        src.read_line("> ").unwrap();
        let (_, output) = src.into_inner();
        assert_eq!(output, b"> ");
    }

    #[test]
    fn test_backslash_joins_lines() {
        let mut src = source("def x := 1 + \\\n2\nnext\n");
        assert_eq!(src.read_line("").unwrap().as_deref(), Some("def x := 1 + \n2"));
        assert_eq!(src.read_line("").unwrap().as_deref(), Some("next"));
    }

    #[test]
    fn test_echo_writes_each_line_after_its_prompt() {
        let mut src = source("1 + 1\nnext\n").with_echo(true);
        src.read_line(">").unwrap();
        src.print_line(">>2").unwrap();
        src.read_line(">").unwrap();
        assert_eq!(src.read_line(">").unwrap(), None);
        let (_, output) = src.into_inner();
        assert_eq!(String::from_utf8(output).unwrap(), ">1 + 1\n>>2\n>next\n>");
    }

    #[test]
    fn test_print_line() {
        let mut src = source("");
        src.print(">>").unwrap();
        src.print_line("2").unwrap();
        let (_, output) = src.into_inner();
        assert_eq!(String::from_utf8(output).unwrap(), ">>2\n");
    }
}
