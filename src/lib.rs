//! Tandem – an interactive console loop driving a single-threaded actor
//!
//! This crate implements the console side of an interactive shell whose code
//! runs inside an actor:
//! - A read-eval-print loop that owns the terminal and submits statements to the actor
//! - A wait/notify rendezvous that turns asynchronous completion into a blocking call
//! - A request queue through which running code asks the console for input or output
//! - Multi-line input accumulation driven by delimiter balance
//! - A reference actor runtime and a small expression language to run against

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Reference actor runtime: mailbox, actor thread, and the submission interface
pub mod actor;

/// Reference language: parser and evaluator for the code typed at the console
pub mod lang;

/// Console modules: line sources, request queue, rendezvous, and the event loop
pub mod shell;

// Re-export key types for convenience
pub use shell::{ConsoleEventLoop, ShellConfig};

/// Current version of the Tandem shell
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
