//! Meta-command recognition
//!
//! A line whose first non-blank character is the command prefix is a
//! console directive rather than source text: `:quit`/`:q` and
//! `:load <path>`/`:l <path>`.

use std::path::PathBuf;

/// How the console should treat one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Ordinary source text for the statement pipeline
    Source,
    /// Stop the console loop
    Quit,
    /// Feed a file's contents through the statement pipeline
    Load(PathBuf),
    /// A known command was given without its argument
    MissingArgument(String),
    /// Unrecognised command name
    Unknown(String),
}

/// Classifies input lines into meta-commands and source text
#[derive(Debug, Clone, Copy)]
pub struct CommandDispatcher {
    prefix: char,
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new(':')
    }
}

impl CommandDispatcher {
    /// Create a dispatcher for the given prefix character
    pub fn new(prefix: char) -> Self {
        Self { prefix }
    }

    /// Classify one full input line.
    pub fn dispatch(&self, line: &str) -> Dispatch {
        let Some(rest) = line.trim_start().strip_prefix(self.prefix) else {
            return Dispatch::Source;
        };

        let rest = rest.trim();
        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };

        match name {
            "quit" | "q" => Dispatch::Quit,
            "load" | "l" if argument.is_empty() => Dispatch::MissingArgument(name.to_string()),
            "load" | "l" => Dispatch::Load(PathBuf::from(argument)),
            _ => Dispatch::Unknown(name.to_string()),
        }
    }
}
