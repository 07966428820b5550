//! Actor-side interface and the reference single-threaded actor
//!
//! The console never evaluates code itself. It hands a parsed unit to an
//! [`ActorHandle`], which queues it for the actor's own thread and reports the
//! outcome through a completion callback.

pub mod mailbox;
pub mod runtime;

use std::sync::Arc;

use thiserror::Error;

use crate::shell::error::EvalError;

pub use mailbox::Mailbox;
pub use runtime::{ActorHost, EventLoopActor};

/// What evaluating a unit produced: the printed form of its value or an error
pub type Outcome = Result<String, EvalError>;

/// One-shot continuation receiving an [`Outcome`]
pub type Completion = Box<dyn FnOnce(Outcome) + Send>;

/// Errors raised when talking to an actor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActorError {
    /// The actor has shut down and refuses new work
    #[error("actor has terminated")]
    Terminated,
}

/// Submission side of an actor.
///
/// `submit` only enqueues. Implementations must invoke `on_complete` exactly
/// once, from their own thread, and never before `submit` has returned.
/// A completion dropped without being invoked is reported to the waiting
/// console as a runtime error.
pub trait ActorHandle: Send + Sync {
    /// Unit of work the actor executes
    type Unit: Send + 'static;

    /// Queue `unit` for execution without waiting for it.
    fn submit(&self, unit: Self::Unit, on_complete: Completion) -> Result<(), ActorError>;
}

impl<A: ActorHandle + ?Sized> ActorHandle for Arc<A> {
    type Unit = A::Unit;

    fn submit(&self, unit: Self::Unit, on_complete: Completion) -> Result<(), ActorError> {
        (**self).submit(unit, on_complete)
    }
}
