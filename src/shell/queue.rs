//! Requests from the actor to the console
//!
//! Running code never touches the terminal. It enqueues a [`Request`] and
//! returns; the console loop services requests in FIFO order the next time
//! it is between read-eval-print cycles.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

/// Continuation invoked with the line read (`None` at end of input)
pub type LineCallback = Box<dyn FnOnce(Option<String>) + Send>;

/// Continuation invoked when the read failed
pub type FailureCallback = Box<dyn FnOnce(io::Error) + Send>;

/// Ask the console for one line of input
pub struct ReadLineRequest {
    prompt: Option<String>,
    on_success: LineCallback,
    on_failure: FailureCallback,
}

impl ReadLineRequest {
    /// Create a request; `prompt` of `None` reads without printing anything
    pub fn new(
        prompt: Option<String>,
        on_success: impl FnOnce(Option<String>) + Send + 'static,
        on_failure: impl FnOnce(io::Error) + Send + 'static,
    ) -> Self {
        Self {
            prompt,
            on_success: Box::new(on_success),
            on_failure: Box::new(on_failure),
        }
    }

    /// Prompt to show before reading
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// Deliver the line. Consumes the request, so only one callback ever runs.
    pub fn succeed(self, line: Option<String>) {
        (self.on_success)(line)
    }

    /// Deliver a read failure. Consumes the request.
    pub fn fail(self, error: io::Error) {
        (self.on_failure)(error)
    }
}

impl fmt::Debug for ReadLineRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadLineRequest")
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

/// Work the console performs on behalf of the actor
#[derive(Debug)]
pub enum Request {
    /// Read one line and hand it to a continuation
    ReadLine(ReadLineRequest),
    /// Write text to the console
    Print {
        /// Text to write
        text: String,
        /// Terminate with a newline
        newline: bool,
    },
}

/// Thread-safe FIFO of pending requests
///
/// Cloning yields another handle onto the same queue.
#[derive(Clone, Default)]
pub struct RequestQueue {
    pending: Arc<Mutex<VecDeque<Request>>>,
}

impl RequestQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request; never blocks on the console.
    pub fn enqueue(&self, request: Request) {
        let mut pending = self.pending.lock();
        pending.push_back(request);
        tracing::debug!("Console request enqueued ({} pending)", pending.len());
    }

    /// Pop the oldest request, if any
    pub fn try_dequeue(&self) -> Option<Request> {
        self.pending.lock().pop_front()
    }

    /// Check if no requests are waiting
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Get the number of pending requests
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Ask the console for a line without a prompt
    pub fn enqueue_read_line(
        &self,
        on_success: impl FnOnce(Option<String>) + Send + 'static,
        on_failure: impl FnOnce(io::Error) + Send + 'static,
    ) {
        self.enqueue(Request::ReadLine(ReadLineRequest::new(
            None, on_success, on_failure,
        )));
    }

    /// Ask the console to write text
    pub fn enqueue_print(&self, text: impl Into<String>, newline: bool) {
        self.enqueue(Request::Print {
            text: text.into(),
            newline,
        });
    }
}

impl fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestQueue")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn tag(request: Request) -> String {
        match request {
            Request::Print { text, .. } => text,
            Request::ReadLine(req) => req.prompt().unwrap_or_default().to_string(),
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = RequestQueue::new();
        assert!(queue.is_empty());

        queue.enqueue_print("a", false);
        queue.enqueue(Request::ReadLine(ReadLineRequest::new(
            Some("b".to_string()),
            |_| {},
            |_| {},
        )));
        queue.enqueue_print("c", true);
        assert_eq!(queue.len(), 3);

        let order: Vec<_> = std::iter::from_fn(|| queue.try_dequeue()).map(tag).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let queue = RequestQueue::new();
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        queue.enqueue_print(format!("{p}:{i}"), false);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let drained: Vec<_> = std::iter::from_fn(|| queue.try_dequeue()).map(tag).collect();
        assert_eq!(drained.len(), 1000);

        // Each producer's own requests keep their relative order.
        for p in 0..4 {
            let mine: Vec<_> = drained
                .iter()
                .filter(|t| t.starts_with(&format!("{p}:")))
                .cloned()
                .collect();
            let expected: Vec<_> = (0..250).map(|i| format!("{p}:{i}")).collect();
            assert_eq!(mine, expected);
        }
    }

    #[test]
    fn test_request_callbacks_fire_once() {
        let (tx, rx) = std::sync::mpsc::channel();
        let fail_tx = tx.clone();
        let request = ReadLineRequest::new(
            None,
            move |line| tx.send(format!("ok:{:?}", line)).unwrap(),
            move |err| fail_tx.send(format!("err:{}", err)).unwrap(),
        );
        request.fail(io::Error::other("closed"));
        assert_eq!(rx.recv().unwrap(), "err:closed");
        assert!(rx.try_recv().is_err());
    }
}
