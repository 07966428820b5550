//! Concurrency tests for the synchronous bridge

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tandem::actor::{ActorError, ActorHandle, Completion, EventLoopActor};
use tandem::lang::parse_program;
use tandem::shell::{RequestQueue, ShellError, SynchronousBridge};

/// Completes every unit from a separate thread as soon as it is submitted
struct Immediate;

impl ActorHandle for Immediate {
    type Unit = u64;

    fn submit(&self, unit: u64, on_complete: Completion) -> Result<(), ActorError> {
        thread::spawn(move || on_complete(Ok(unit.to_string())));
        Ok(())
    }
}

#[test]
fn test_back_to_back_submissions_never_hang() {
    for _ in 0..200 {
        let bridge = SynchronousBridge::new(Immediate);
        for n in 0..10u64 {
            assert_eq!(bridge.submit_and_wait(n).unwrap(), n.to_string());
        }
    }
}

/// Holds completions and releases them newest first after a delay
#[derive(Clone, Default)]
struct Reversing {
    held: Arc<Mutex<Vec<(String, Completion)>>>,
}

impl ActorHandle for Reversing {
    type Unit = String;

    fn submit(&self, unit: String, on_complete: Completion) -> Result<(), ActorError> {
        let mut held = self.held.lock();
        held.push((unit, on_complete));
        if held.len() == 2 {
            let batch: Vec<_> = held.drain(..).rev().collect();
            thread::spawn(move || {
                for (unit, on_complete) in batch {
                    thread::sleep(Duration::from_millis(20));
                    on_complete(Ok(unit));
                }
            });
        }
        Ok(())
    }
}

#[test]
fn test_each_waiter_gets_its_own_outcome_when_completed_out_of_order() {
    for _ in 0..20 {
        let actor = Reversing::default();
        let first = SynchronousBridge::new(actor.clone());
        let second = SynchronousBridge::new(actor);

        let handle = thread::spawn(move || first.submit_and_wait("first".to_string()));
        thread::sleep(Duration::from_millis(5));
        let second_result = second.submit_and_wait("second".to_string()).unwrap();

        assert_eq!(second_result, "second");
        assert_eq!(handle.join().unwrap().unwrap(), "first");
    }
}

#[test]
fn test_reference_actor_round_trips() {
    let queue = RequestQueue::new();
    let actor = EventLoopActor::spawn(queue, vec![]).unwrap();
    let bridge = SynchronousBridge::new(actor);

    bridge
        .submit_and_wait(parse_program("def total := 0", "test").unwrap())
        .unwrap();
    for _ in 0..500 {
        bridge
            .submit_and_wait(parse_program("total := total + 1", "test").unwrap())
            .unwrap();
    }
    let total = bridge
        .submit_and_wait(parse_program("total", "test").unwrap())
        .unwrap();
    assert_eq!(total, "500");

    match bridge.submit_and_wait(parse_program("total / 0", "test").unwrap()) {
        Err(ShellError::Runtime(err)) => assert_eq!(err.message, "division by zero"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_terminated_actor_is_reported() {
    let actor = EventLoopActor::spawn(RequestQueue::new(), vec![]).unwrap();
    actor.shutdown();
    let bridge = SynchronousBridge::new(actor);
    let result = bridge.submit_and_wait(parse_program("1", "test").unwrap());
    assert!(matches!(result, Err(ShellError::Actor(ActorError::Terminated))));
    assert!(!bridge.is_pending());
}
