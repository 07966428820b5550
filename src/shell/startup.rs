//! Code evaluated before the console takes over the terminal
//!
//! The init file runs first with its result discarded. The main code (`-e`
//! or a source file) runs next and its result is always printed. Output the
//! actor produced along the way is flushed before the next step starts.

use std::fs;
use std::path::Path;

use super::error::Result;
use super::event_loop::{ConsoleEventLoop, LoopExit};
use super::line_source::LineSource;
use crate::actor::ActorHandle;
use crate::lang::SourceParser;

/// Label for code given on the command line
pub const COMMAND_LINE_LABEL: &str = "command line";

/// A labelled piece of startup code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupSource {
    /// Label used in diagnostics
    pub label: String,
    /// Source text
    pub text: String,
}

impl StartupSource {
    /// Load a source file, labelled with its path
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self {
            label: path.display().to_string(),
            text,
        })
    }

    /// Code passed inline on the command line
    pub fn inline(code: impl Into<String>) -> Self {
        Self {
            label: COMMAND_LINE_LABEL.to_string(),
            text: code.into(),
        }
    }
}

/// Startup sequence for one session
#[derive(Debug, Clone, Default)]
pub struct Startup {
    /// Evaluated first, result discarded
    pub init: Option<StartupSource>,
    /// Evaluated second, result printed
    pub main: Option<StartupSource>,
    /// Stop after the main code instead of entering the loop
    pub print_and_exit: bool,
}

impl Startup {
    /// Run the startup code on `console`, then hand it the terminal unless
    /// `print_and_exit` is set, in which case the session ends with
    /// [`LoopExit::Quit`].
    pub fn run<S, P, A>(&self, console: &mut ConsoleEventLoop<S, P, A>) -> Result<LoopExit>
    where
        S: LineSource,
        P: SourceParser,
        A: ActorHandle<Unit = P::Unit>,
    {
        if let Some(init) = &self.init {
            tracing::debug!("Running init code from {}", init.label);
            console.run_source(&init.text, &init.label, false)?;
            console.drain()?;
        }
        if let Some(main) = &self.main {
            tracing::debug!("Running startup code from {}", main.label);
            console.run_source(&main.text, &main.label, true)?;
            console.drain()?;
        }
        if self.print_and_exit {
            return Ok(LoopExit::Quit);
        }
        console.run()
    }
}
