//! The reference actor: one thread, one mailbox, one interpreter

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use super::mailbox::Mailbox;
use super::{ActorError, ActorHandle, Completion};
use crate::lang::{Host, Interpreter, Program, Value};
use crate::shell::queue::{ReadLineRequest, Request, RequestQueue};

enum Job {
    Evaluate {
        unit: Program,
        on_complete: Completion,
    },
    /// Bind the answer to a console read into the global scope
    Bind { name: String, value: Value },
}

/// Host view the interpreter gets while running on the actor thread.
///
/// Console I/O becomes [`RequestQueue`] entries; answers to reads come back
/// as mailbox jobs, so they are processed in turn like everything else.
pub struct ActorHost {
    console: RequestQueue,
    argv: Vec<String>,
    mailbox: Arc<Mailbox<Job>>,
}

impl Host for ActorHost {
    fn print(&mut self, text: String, newline: bool) {
        self.console.enqueue_print(text, newline);
    }

    fn read_line(&mut self, target: String, prompt: Option<String>) {
        let on_line = {
            let mailbox = self.mailbox.clone();
            let name = target.clone();
            move |line: Option<String>| {
                let value = line.map(Value::Text).unwrap_or(Value::Nil);
                post_binding(&mailbox, name, value);
            }
        };
        let on_error = {
            let mailbox = self.mailbox.clone();
            move |err: io::Error| {
                tracing::warn!("Console read for '{}' failed: {}", target, err);
                post_binding(&mailbox, target, Value::Nil);
            }
        };
        self.console.enqueue(Request::ReadLine(ReadLineRequest::new(
            prompt, on_line, on_error,
        )));
    }

    fn argv(&self) -> &[String] {
        &self.argv
    }
}

fn post_binding(mailbox: &Mailbox<Job>, name: String, value: Value) {
    if mailbox.post(Job::Bind { name, value }).is_err() {
        tracing::debug!("Actor terminated before a console read was delivered");
    }
}

/// Actor running an [`Interpreter`] on a dedicated thread
///
/// Units are executed one at a time in submission order. Dropping the actor
/// closes its mailbox, lets queued work finish and joins the thread.
pub struct EventLoopActor {
    mailbox: Arc<Mailbox<Job>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl EventLoopActor {
    /// Start the actor thread.
    ///
    /// `console` receives the actor's I/O requests; `argv` is what the
    /// `argv()` builtin returns.
    pub fn spawn(console: RequestQueue, argv: Vec<String>) -> io::Result<Self> {
        let mailbox = Arc::new(Mailbox::new());
        let mut host = ActorHost {
            console,
            argv,
            mailbox: mailbox.clone(),
        };
        let inbox = CloseOnExit(mailbox.clone());
        let thread = thread::Builder::new()
            .name("tandem-actor".to_string())
            .spawn(move || {
                let mut interpreter = Interpreter::new();
                while let Some(job) = inbox.0.next() {
                    run_job(&mut interpreter, &mut host, job);
                }
                tracing::debug!("Actor thread exiting");
            })?;

        Ok(Self {
            mailbox,
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Stop accepting work, finish what is queued and join the thread.
    pub fn shutdown(&self) {
        self.mailbox.close();
        if let Some(thread) = self.thread.lock().take() {
            if thread.join().is_err() {
                tracing::error!("Actor thread panicked");
            }
        }
    }

    /// Check if the actor still accepts work
    pub fn is_running(&self) -> bool {
        !self.mailbox.is_closed()
    }
}

/// Closes the mailbox when the actor thread ends, including by panic, so
/// later submissions are refused instead of queued forever.
struct CloseOnExit(Arc<Mailbox<Job>>);

impl Drop for CloseOnExit {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::error!("Actor thread panicked; refusing further work");
        }
        self.0.close();
    }
}

fn run_job(interpreter: &mut Interpreter, host: &mut ActorHost, job: Job) {
    match job {
        Job::Evaluate { unit, on_complete } => {
            tracing::debug!("Evaluating unit from {}", unit.label);
            let outcome = interpreter
                .execute(&unit, host)
                .map(|value| value.to_string());
            on_complete(outcome);
        }
        Job::Bind { name, value } => {
            tracing::trace!("Binding console input to '{}'", name);
            interpreter.define_global(name, value);
        }
    }
}

impl ActorHandle for EventLoopActor {
    type Unit = Program;

    fn submit(&self, unit: Program, on_complete: Completion) -> Result<(), ActorError> {
        self.mailbox
            .post(Job::Evaluate { unit, on_complete })
            .map_err(|_| ActorError::Terminated)
    }
}

impl Drop for EventLoopActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
