//! Error types for the interactive shell
//!
//! Syntax and evaluation errors are produced by the external collaborators
//! (parser and actor) and reported at the statement boundary. Terminal I/O
//! failures and rendezvous misuse are the only errors that stop the loop.

use std::fmt;
use std::io;
use thiserror::Error;

use crate::actor::ActorError;

/// Source text failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{label}:{line}:{column}: {message}")]
pub struct SyntaxError {
    /// Label of the source (file name, "console", ...)
    pub label: String,
    /// 1-based line of the offending token
    pub line: usize,
    /// 1-based column of the offending token
    pub column: usize,
    /// Full text of the offending source line
    pub offending: String,
    /// Description of what went wrong
    pub message: String,
}

impl SyntaxError {
    /// Render the offending line followed by a caret under the column.
    pub fn marker(&self) -> String {
        format!(
            "{}\n{}^",
            self.offending,
            " ".repeat(self.column.saturating_sub(1))
        )
    }
}

/// The actor raised an error while executing a unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct EvalError {
    /// Description of the failure
    pub message: String,
    /// Invocation trace, innermost frame first
    pub trace: Vec<String>,
}

impl EvalError {
    /// Create an error without trace information
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// Append an enclosing frame to the trace
    pub fn within(mut self, frame: impl Into<String>) -> Self {
        self.trace.push(frame.into());
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for frame in &self.trace {
            write!(f, "\n  at {}", frame)?;
        }
        Ok(())
    }
}

/// Top-level shell error
#[derive(Debug, Error)]
pub enum ShellError {
    /// Parse failure, reported and survived
    #[error("parse error in {0}")]
    Syntax(#[from] SyntaxError),

    /// Evaluation failure, reported and survived
    #[error("{0}")]
    Runtime(#[from] EvalError),

    /// Console or file I/O failure
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed configuration file
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// The actor no longer accepts work
    #[error("Actor error: {0}")]
    Actor(#[from] ActorError),

    /// A core invariant was violated (e.g. overlapping rendezvous)
    #[error("Misuse: {0}")]
    Misuse(String),
}

impl ShellError {
    /// Whether the console loop must stop when this error reaches it
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShellError::Io(_) | ShellError::Actor(_) | ShellError::Misuse(_)
        )
    }
}

/// Result type using ShellError
pub type Result<T> = std::result::Result<T, ShellError>;
