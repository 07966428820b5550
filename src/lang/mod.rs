//! A small expression language for the console
//!
//! Values are integers, text, booleans, `nil` and tables. Statements are
//! separated by newlines or `;`, `def name := value` introduces a variable and
//! `{ ... }` evaluates to its last statement. Console I/O builtins (`print`,
//! `println`, `readln`) never touch the terminal themselves; they go through
//! the evaluator's [`Host`].

pub mod ast;
pub mod eval;
pub mod parser;
pub mod value;

pub use ast::{BinOp, Expr, Program, Stmt};
pub use eval::{Host, Interpreter};
pub use parser::parse_program;
pub use value::Value;

use crate::shell::error::SyntaxError;

/// Turns console text into units of work for an actor.
pub trait SourceParser: Send {
    /// What the actor executes
    type Unit: Send + 'static;

    /// Parse `source`; `label` names where it came from in diagnostics.
    fn parse(&self, source: &str, label: &str) -> Result<Self::Unit, SyntaxError>;
}

/// [`SourceParser`] for this crate's language
#[derive(Debug, Clone, Copy, Default)]
pub struct LangParser;

impl SourceParser for LangParser {
    type Unit = Program;

    fn parse(&self, source: &str, label: &str) -> Result<Program, SyntaxError> {
        parse_program(source, label)
    }
}
