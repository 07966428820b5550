//! The console side of the shell
//!
//! The console thread owns the terminal. It runs [`ConsoleEventLoop`], which
//! reads statements through a [`LineSource`], submits them to the actor via a
//! [`SynchronousBridge`], and services [`Request`]s the actor leaves in the
//! [`RequestQueue`].

pub mod accumulator;
pub mod bridge;
pub mod command;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod line_source;
pub mod queue;
pub mod startup;

pub use accumulator::{Accumulator, BalanceMode, Progress};
pub use bridge::{RendezvousToken, SynchronousBridge};
pub use command::{CommandDispatcher, Dispatch};
pub use config::ShellConfig;
pub use error::{EvalError, Result, ShellError, SyntaxError};
pub use event_loop::{ConsoleEventLoop, LoopExit, LoopState};
pub use line_source::{EditorLineSource, LineSource, PlainLineSource};
pub use queue::{ReadLineRequest, Request, RequestQueue};
pub use startup::{Startup, StartupSource};
