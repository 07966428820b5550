//! Multi-line statement accumulation
//!
//! A statement is complete once every opening delimiter seen so far has been
//! closed. Counting is a plain sum over `( [ {` minus `) ] }`; which delimiter
//! closes which is never checked.

use serde::{Deserialize, Serialize};

/// How delimiters are counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceMode {
    /// Count every delimiter character, including inside literals
    #[default]
    Plain,
    /// Skip delimiters inside `"..."` strings and `//` comments
    Lexical,
}

/// Openers minus closers over every character of `text`.
pub fn balance(text: &str) -> i64 {
    text.chars().map(delimiter_weight).sum()
}

/// Like [`balance`], but ignores string literals and line comments.
pub fn lexical_balance(text: &str) -> i64 {
    let mut total = 0;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => {
                            chars.next();
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
            }
            other => total += delimiter_weight(other),
        }
    }
    total
}

fn delimiter_weight(ch: char) -> i64 {
    match ch {
        '(' | '[' | '{' => 1,
        ')' | ']' | '}' => -1,
        _ => 0,
    }
}

/// Result of feeding one more line into an [`Accumulator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The statement is complete; the accumulated text is handed back
    Complete(String),
    /// More input is needed; `balance` openers are still unmatched
    NeedsMore {
        /// Outstanding opener count
        balance: i64,
    },
    /// An empty continuation line abandoned the statement
    Abandoned,
}

/// Accumulation state for one logical statement
#[derive(Debug, Default)]
pub struct Accumulator {
    mode: BalanceMode,
    buffer: String,
    pending: bool,
}

impl Accumulator {
    /// Create an empty accumulator
    pub fn new(mode: BalanceMode) -> Self {
        Self {
            mode,
            buffer: String::new(),
            pending: false,
        }
    }

    /// Whether a statement is partially accumulated
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Feed one line (or a whole file's text) into the statement.
    pub fn push_line(&mut self, line: &str) -> Progress {
        if self.pending {
            if line.is_empty() {
                self.reset();
                return Progress::Abandoned;
            }
            self.buffer.push('\n');
        }
        self.buffer.push_str(line);

        let outstanding = match self.mode {
            BalanceMode::Plain => balance(&self.buffer),
            BalanceMode::Lexical => lexical_balance(&self.buffer),
        };

        if outstanding <= 0 {
            self.pending = false;
            Progress::Complete(std::mem::take(&mut self.buffer))
        } else {
            self.pending = true;
            Progress::NeedsMore {
                balance: outstanding,
            }
        }
    }

    /// Drop any partially accumulated statement
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.pending = false;
    }
}

/// Prompt for a continuation line, indented by the nesting depth.
pub fn continuation_prompt(balance: i64) -> String {
    " ".repeat(balance.max(0) as usize)
}
