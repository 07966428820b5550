//! The console event loop
//!
//! The loop alternates between two states. In `IdleTurn` with an empty
//! request queue it runs one full read-eval-print cycle. As soon as the queue
//! holds anything it switches to `Draining` and services requests in FIFO
//! order until the queue is empty again. A read-eval-print cycle already in
//! progress is never interrupted.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use super::accumulator::{Accumulator, Progress, continuation_prompt};
use super::bridge::SynchronousBridge;
use super::command::{CommandDispatcher, Dispatch};
use super::config::ShellConfig;
use super::error::{Result, ShellError};
use super::line_source::LineSource;
use super::queue::{Request, RequestQueue};
use crate::actor::ActorHandle;
use crate::lang::SourceParser;

/// Label used for statements typed at the prompt
pub const CONSOLE_LABEL: &str = "console";

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// The console owns the turn
    IdleTurn,
    /// Servicing queued requests
    Draining,
    /// Terminal; no further prompts
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::IdleTurn => write!(f, "idle-turn"),
            LoopState::Draining => write!(f, "draining"),
            LoopState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why the loop stopped normally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A quit meta-command
    Quit,
    /// The console reached end of input
    EndOfInput,
}

/// Drives the terminal session for one actor
pub struct ConsoleEventLoop<S, P, A> {
    source: S,
    parser: P,
    bridge: SynchronousBridge<A>,
    queue: RequestQueue,
    dispatcher: CommandDispatcher,
    accumulator: Accumulator,
    config: ShellConfig,
    state: LoopState,
    exit: Option<LoopExit>,
}

impl<S, P, A> ConsoleEventLoop<S, P, A>
where
    S: LineSource,
    P: SourceParser,
    A: ActorHandle<Unit = P::Unit>,
{
    /// Assemble a loop. `queue` must be the queue the actor posts requests to.
    pub fn new(
        source: S,
        parser: P,
        bridge: SynchronousBridge<A>,
        queue: RequestQueue,
        config: ShellConfig,
    ) -> Self {
        Self {
            source,
            parser,
            bridge,
            queue,
            dispatcher: CommandDispatcher::new(config.command_prefix),
            accumulator: Accumulator::new(config.balance),
            config,
            state: LoopState::IdleTurn,
            exit: None,
        }
    }

    /// Current state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Why the loop stopped, once it has
    pub fn exit(&self) -> Option<LoopExit> {
        self.exit
    }

    /// The console line source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The queue the actor posts requests to
    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// Run until the loop stops.
    ///
    /// Returns how it stopped, or the fatal error that stopped it.
    pub fn run(&mut self) -> Result<LoopExit> {
        loop {
            if let Some(exit) = self.exit {
                return Ok(exit);
            }
            if self.state == LoopState::Stopped {
                return Err(ShellError::Misuse("console loop already aborted".to_string()));
            }
            if let Err(err) = self.step() {
                tracing::error!("Console loop aborted: {}", err);
                self.stop(None);
                return Err(err);
            }
        }
    }

    /// Perform one transition of the state machine.
    ///
    /// Only fatal errors are returned; everything else is reported on the
    /// console.
    pub fn step(&mut self) -> Result<()> {
        match self.state {
            LoopState::IdleTurn if !self.queue.is_empty() => {
                self.transition(LoopState::Draining);
                Ok(())
            }
            LoopState::IdleTurn => self.read_eval_print(),
            LoopState::Draining => {
                match self.queue.try_dequeue() {
                    Some(request) => self.service(request),
                    None => self.transition(LoopState::IdleTurn),
                }
                Ok(())
            }
            LoopState::Stopped => Ok(()),
        }
    }

    /// Service every request currently queued, then return to the idle turn.
    pub fn drain(&mut self) -> Result<()> {
        if self.state == LoopState::Stopped {
            return Ok(());
        }
        while let Some(request) = self.queue.try_dequeue() {
            self.service(request);
        }
        self.transition(LoopState::IdleTurn);
        Ok(())
    }

    /// Evaluate a complete piece of source, printing the result if `echo`.
    ///
    /// Parse and evaluation errors are reported on the console.
    pub fn run_source(&mut self, text: &str, label: &str, echo: bool) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        match self.evaluate(text, label) {
            Ok(value) if echo => {
                let line = format!("{}{}", self.config.result_prefix(), value);
                self.source.print_line(&line)?;
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(err) => self.report(err),
        }
    }

    /// Parse `text` and run it on the actor, waiting for the outcome.
    pub fn evaluate(&mut self, text: &str, label: &str) -> Result<String> {
        let unit = self.parser.parse(text, label)?;
        self.bridge.submit_and_wait(unit)
    }

    /// Print a diagnostic for a recoverable error; fatal errors are returned.
    pub fn report(&mut self, err: ShellError) -> Result<()> {
        if err.is_fatal() {
            return Err(err);
        }
        match err {
            ShellError::Syntax(syntax) => {
                self.source.print_line(&format!("parse error in {}", syntax))?;
                self.source.print_line(&syntax.marker())?;
            }
            other => self.source.print_line(&other.to_string())?,
        }
        Ok(())
    }

    fn read_eval_print(&mut self) -> Result<()> {
        let prompt = self.config.statement_prompt().to_string();
        let Some(line) = self.source.read_line(&prompt)? else {
            self.stop(Some(LoopExit::EndOfInput));
            return Ok(());
        };

        match self.dispatcher.dispatch(&line) {
            Dispatch::Source => self.run_statement(&line, CONSOLE_LABEL),
            Dispatch::Quit => {
                self.stop(Some(LoopExit::Quit));
                Ok(())
            }
            Dispatch::Load(path) => self.load(&path),
            Dispatch::MissingArgument(name) => {
                let message = format!("{}{} needs an argument", self.config.command_prefix, name);
                self.source.print_line(&message)?;
                Ok(())
            }
            Dispatch::Unknown(name) => {
                tracing::warn!("Unknown console command '{}'", name);
                let message = format!("unknown command: {}{}", self.config.command_prefix, name);
                self.source.print_line(&message)?;
                Ok(())
            }
        }
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                self.source
                    .print_line(&format!("cannot load {}: {}", path.display(), err))?;
                return Ok(());
            }
        };
        tracing::debug!("Loading {}", path.display());
        let label = path.display().to_string();
        self.run_statement(text.trim_end_matches(['\n', '\r']), &label)
    }

    /// Accumulate continuation lines until `first` forms a complete statement.
    fn run_statement(&mut self, first: &str, label: &str) -> Result<()> {
        let mut progress = self.accumulator.push_line(first);
        loop {
            match progress {
                Progress::Complete(text) => return self.run_source(&text, label, true),
                Progress::Abandoned => {
                    tracing::trace!("Statement abandoned");
                    return Ok(());
                }
                Progress::NeedsMore { balance } => {
                    let prompt = if self.config.quiet {
                        String::new()
                    } else {
                        continuation_prompt(balance)
                    };
                    let Some(line) = self.source.read_line(&prompt)? else {
                        self.accumulator.reset();
                        self.stop(Some(LoopExit::EndOfInput));
                        return Ok(());
                    };
                    progress = self.accumulator.push_line(&line);
                }
            }
        }
    }

    fn service(&mut self, request: Request) {
        tracing::debug!("Servicing console request ({} left)", self.queue.len());
        match request {
            Request::ReadLine(request) => {
                let prompt = request.prompt().unwrap_or_default().to_string();
                match self.source.read_line(&prompt) {
                    Ok(line) => request.succeed(line),
                    Err(err) => request.fail(err),
                }
            }
            Request::Print { text, newline } => {
                let written = if newline {
                    self.source.print_line(&text)
                } else {
                    self.source.print(&text)
                };
                if let Err(err) = written {
                    tracing::warn!("Failed to write actor output: {}", err);
                }
            }
        }
    }

    fn transition(&mut self, next: LoopState) {
        if self.state != next {
            tracing::trace!("Console loop {} -> {}", self.state, next);
            self.state = next;
        }
    }

    /// Enter the terminal state. Remaining output is flushed; remaining reads fail.
    fn stop(&mut self, exit: Option<LoopExit>) {
        self.transition(LoopState::Stopped);
        self.exit = exit;
        while let Some(request) = self.queue.try_dequeue() {
            match request {
                Request::ReadLine(request) => request.fail(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "console loop stopped",
                )),
                Request::Print { text, newline } => {
                    let _ = if newline {
                        self.source.print_line(&text)
                    } else {
                        self.source.print(&text)
                    };
                }
            }
        }
    }
}
