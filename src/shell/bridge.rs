//! Blocking submission on top of the actor's asynchronous interface
//!
//! [`SynchronousBridge::submit_and_wait`] records a fresh token as awaited and
//! submits the unit while holding the rendezvous lock. The completion callback
//! needs that same lock to publish its outcome, so it cannot run between the
//! submit and the wait: the wait atomically releases the lock. Only an outcome
//! carrying the awaited token ends the wait; anything else is dropped.
//!
//! A completion the actor drops without calling still reports, as a runtime
//! error, so a lost unit never leaves the console waiting.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use super::error::{EvalError, Result, ShellError};
use crate::actor::{ActorHandle, Outcome};

/// Identifies one submission awaiting its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendezvousToken(pub Uuid);

impl RendezvousToken {
    /// Create a new random token
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RendezvousToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RendezvousToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct Slot {
    /// The pending rendezvous, if any
    awaiting: Option<RendezvousToken>,
    delivered: Option<(RendezvousToken, Outcome)>,
}

const ABANDONED: &str = "actor dropped the unit without completing it";

#[derive(Default)]
struct Rendezvous {
    slot: Mutex<Slot>,
    signal: Condvar,
    /// Completion dropped inside `submit`, while the submitter holds `slot`
    abandoned_inline: Mutex<Option<RendezvousToken>>,
}

impl Rendezvous {
    fn complete(&self, token: RendezvousToken, outcome: Outcome) {
        let mut slot = self.slot.lock();
        if slot.awaiting != Some(token) {
            tracing::warn!("Dropping completion for {} which is not awaited", token);
            return;
        }
        tracing::debug!("Completion delivered for {}", token);
        slot.delivered = Some((token, outcome));
        self.signal.notify_all();
    }
}

/// Delivers exactly one outcome for a token, whether or not it is invoked
struct CompletionGuard {
    rendezvous: Arc<Rendezvous>,
    token: RendezvousToken,
    submitter: ThreadId,
    fired: bool,
}

impl CompletionGuard {
    fn fire(mut self, outcome: Outcome) {
        self.fired = true;
        self.rendezvous.complete(self.token, outcome);
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.fired {
            return;
        }
        tracing::warn!("Actor dropped the completion for {}", self.token);
        if thread::current().id() == self.submitter {
            *self.rendezvous.abandoned_inline.lock() = Some(self.token);
        } else {
            self.rendezvous
                .complete(self.token, Err(EvalError::new(ABANDONED)));
        }
    }
}

/// Turns the actor's submit-with-callback into a blocking call
pub struct SynchronousBridge<A> {
    actor: A,
    rendezvous: Arc<Rendezvous>,
}

impl<A: ActorHandle> SynchronousBridge<A> {
    /// Wrap an actor handle
    pub fn new(actor: A) -> Self {
        Self {
            actor,
            rendezvous: Arc::new(Rendezvous::default()),
        }
    }

    /// The wrapped actor handle
    pub fn actor(&self) -> &A {
        &self.actor
    }

    /// Check if a submission is currently awaiting its result
    pub fn is_pending(&self) -> bool {
        self.rendezvous.slot.lock().awaiting.is_some()
    }

    /// Submit `unit` and block until the actor reports its outcome.
    ///
    /// Evaluation failures come back as [`ShellError::Runtime`]. Calling this
    /// while another call is still waiting fails with [`ShellError::Misuse`].
    pub fn submit_and_wait(&self, unit: A::Unit) -> Result<String> {
        let token = RendezvousToken::new();
        let mut slot = self.rendezvous.slot.lock();
        if let Some(pending) = slot.awaiting {
            return Err(ShellError::Misuse(format!(
                "submission {} is still awaiting its result",
                pending
            )));
        }
        slot.awaiting = Some(token);
        slot.delivered = None;

        let guard = CompletionGuard {
            rendezvous: Arc::clone(&self.rendezvous),
            token,
            submitter: thread::current().id(),
            fired: false,
        };
        tracing::debug!("Submitting unit as {}", token);
        let submitted = self
            .actor
            .submit(unit, Box::new(move |outcome: Outcome| guard.fire(outcome)));
        let abandoned = self.rendezvous.abandoned_inline.lock().take() == Some(token);
        if let Err(err) = submitted {
            slot.awaiting = None;
            return Err(err.into());
        }
        if abandoned {
            slot.awaiting = None;
            return Err(ShellError::Runtime(EvalError::new(ABANDONED)));
        }

        loop {
            match slot.delivered.take() {
                Some((delivered, outcome)) if delivered == token => {
                    slot.awaiting = None;
                    return outcome.map_err(ShellError::Runtime);
                }
                Some((delivered, _)) => {
                    tracing::warn!("Ignoring outcome for {} while awaiting {}", delivered, token);
                }
                None => {}
            }
            self.rendezvous.signal.wait(&mut slot);
        }
    }
}
