//! End-to-end tests for the console event loop

use parking_lot::Mutex;
use std::io::{self, Cursor, Write};
use std::sync::Arc;
use std::thread;

use tandem::actor::{ActorError, ActorHandle, Completion, EventLoopActor};
use tandem::lang::{LangParser, Program, SourceParser};
use tandem::shell::{
    ConsoleEventLoop, LineSource, LoopExit, LoopState, PlainLineSource, RequestQueue,
    ShellConfig, ShellError, SynchronousBridge, SyntaxError,
};

/// Output sink that stays readable after the loop takes ownership of the source
#[derive(Clone, Default)]
struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().clone()).unwrap()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

type ScriptedSource = PlainLineSource<Cursor<Vec<u8>>, SharedOutput>;

fn scripted(input: &str) -> (ScriptedSource, SharedOutput) {
    let output = SharedOutput::default();
    let source = PlainLineSource::new(Cursor::new(input.as_bytes().to_vec()), output.clone());
    (source, output)
}

fn quiet() -> ShellConfig {
    ShellConfig {
        quiet: true,
        ..Default::default()
    }
}

/// Run a session against the reference actor
fn session(input: &str, config: ShellConfig) -> (LoopExit, String) {
    let (source, output) = scripted(input);
    let queue = RequestQueue::new();
    let actor = EventLoopActor::spawn(queue.clone(), vec!["first".to_string()]).unwrap();
    let mut console =
        ConsoleEventLoop::new(source, LangParser, SynchronousBridge::new(actor), queue, config);
    let exit = console.run().unwrap();
    assert_eq!(console.state(), LoopState::Stopped);
    (exit, output.contents())
}

/// Parser that records every statement it is handed
#[derive(Clone, Default)]
struct RecordingParser {
    seen: Arc<Mutex<Vec<String>>>,
}

impl SourceParser for RecordingParser {
    type Unit = Program;

    fn parse(&self, source: &str, label: &str) -> Result<Program, SyntaxError> {
        self.seen.lock().push(source.to_string());
        LangParser.parse(source, label)
    }
}

#[test]
fn test_result_printed_with_prefix() {
    let (exit, output) = session("1 + 1\n", ShellConfig::default());
    assert_eq!(exit, LoopExit::EndOfInput);
    assert_eq!(output, ">>>2\n>");
}

#[test]
fn test_quiet_prints_bare_result() {
    let (_, output) = session("1 + 1\n", quiet());
    assert_eq!(output, "2\n");
}

#[test]
fn test_continuation_forms_one_statement() {
    let (source, output) = scripted("def x := {\n}\nx\n");
    let parser = RecordingParser::default();
    let queue = RequestQueue::new();
    let actor = EventLoopActor::spawn(queue.clone(), vec![]).unwrap();
    let mut console = ConsoleEventLoop::new(
        source,
        parser.clone(),
        SynchronousBridge::new(actor),
        queue,
        ShellConfig::default(),
    );
    console.run().unwrap();

    assert_eq!(
        *parser.seen.lock(),
        vec!["def x := {\n}".to_string(), "x".to_string()]
    );
    // The continuation prompt is indented by the nesting depth.
    assert_eq!(output.contents(), "> >>nil\n>>>nil\n>");
}

#[test]
fn test_empty_continuation_line_abandons_statement() {
    let (_, output) = session("{ 1 +\n\n7\n", quiet());
    assert_eq!(output, "7\n");
}

#[test]
fn test_quit_stops_without_further_prompts() {
    let (exit, output) = session("1\n:quit\n2\n", ShellConfig::default());
    assert_eq!(exit, LoopExit::Quit);
    assert_eq!(output, ">>>1\n>");
}

#[test]
fn test_load_matches_typing_the_file() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("foo.src");
    std::fs::write(&path, "42\n").unwrap();

    let (_, loaded) = session(&format!(":load {}\n", path.display()), quiet());
    let (_, typed) = session("42\n", quiet());
    assert_eq!(loaded, "42\n");
    assert_eq!(loaded, typed);
}

#[test]
fn test_load_missing_file_is_reported() {
    let (exit, output) = session(":l /definitely/not/here.src\n1\n", quiet());
    assert_eq!(exit, LoopExit::EndOfInput);
    assert!(output.starts_with("cannot load /definitely/not/here.src: "));
    assert!(output.ends_with("\n1\n"));
}

#[test]
fn test_unknown_command_is_reported_and_loop_continues() {
    let (_, output) = session(":frob\n1\n", quiet());
    assert_eq!(output, "unknown command: :frob\n1\n");
}

#[test]
fn test_parse_error_shows_line_and_marker() {
    let (_, output) = session("1 + )\n2\n", quiet());
    assert_eq!(
        output,
        "parse error in console:1:5: unexpected ')'\n1 + )\n    ^\n2\n"
    );
}

#[test]
fn test_runtime_error_shows_trace() {
    let (_, output) = session("1 / 0\n", quiet());
    assert_eq!(output, "division by zero\n  at '/' at console:1\n");
}

#[test]
fn test_actor_output_goes_through_the_console() {
    let (_, output) = session("println(\"hi \", argv())\n", quiet());
    assert_eq!(output, "nil\nhi [\"first\"]\n");
}

#[test]
fn test_readln_is_serviced_before_next_prompt() {
    let (_, output) = session("readln(\"name\", \"who? \")\nAlice\nname\n", ShellConfig::default());
    assert_eq!(output, ">>>nil\nwho? >>>\"Alice\"\n>");
}

#[test]
fn test_readln_at_end_of_input_binds_nil() {
    let (exit, output) = session("def name := 1; readln(\"name\")\n", quiet());
    assert_eq!(exit, LoopExit::EndOfInput);
    assert_eq!(output, "nil\n");
}

/// Parser that hands the raw text to the actor
struct RawParser;

impl SourceParser for RawParser {
    type Unit = String;

    fn parse(&self, source: &str, _label: &str) -> Result<String, SyntaxError> {
        Ok(source.to_string())
    }
}

/// Enqueues tagged read requests while "running" a unit, then completes it
struct BurstActor {
    console: RequestQueue,
    reads: usize,
    log: Arc<Mutex<Vec<String>>>,
}

impl ActorHandle for BurstActor {
    type Unit = String;

    fn submit(&self, unit: String, on_complete: Completion) -> Result<(), ActorError> {
        let console = self.console.clone();
        let reads = if unit == "burst" { self.reads } else { 0 };
        let log = self.log.clone();
        thread::spawn(move || {
            for tag in 0..reads {
                let log = log.clone();
                console.enqueue_read_line(
                    move |line| log.lock().push(format!("r{}={}", tag, line.unwrap_or_default())),
                    |err| panic!("unexpected read failure: {}", err),
                );
            }
            on_complete(Ok("ok".to_string()));
        });
        Ok(())
    }
}

#[test]
fn test_queued_reads_drain_in_order_before_next_prompt() {
    let (source, output) = scripted("burst\nl0\nl1\nl2\n:quit\n");
    let queue = RequestQueue::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let actor = BurstActor {
        console: queue.clone(),
        reads: 3,
        log: log.clone(),
    };
    let mut console = ConsoleEventLoop::new(
        source,
        RawParser,
        SynchronousBridge::new(actor),
        queue,
        ShellConfig::default(),
    );

    assert_eq!(console.run().unwrap(), LoopExit::Quit);
    assert_eq!(*log.lock(), vec!["r0=l0", "r1=l1", "r2=l2"]);
    // Requests are read without a prompt; one prompt follows the drain.
    assert_eq!(output.contents(), ">>>ok\n>");
}

/// Console whose terminal has gone away
struct BrokenTerminal;

impl LineSource for BrokenTerminal {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"))
    }

    fn print(&mut self, _text: &str) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_request_failure_is_delivered_and_prompt_failure_is_fatal() {
    let queue = RequestQueue::new();
    let failures = Arc::new(Mutex::new(Vec::new()));
    {
        let failures = failures.clone();
        queue.enqueue_read_line(
            |_| panic!("read should not succeed"),
            move |err| failures.lock().push(err.kind()),
        );
    }
    let actor = BurstActor {
        console: queue.clone(),
        reads: 0,
        log: Arc::default(),
    };
    let mut console = ConsoleEventLoop::new(
        BrokenTerminal,
        RawParser,
        SynchronousBridge::new(actor),
        queue,
        ShellConfig::default(),
    );

    let result = console.run();
    assert!(matches!(result, Err(ShellError::Io(_))));
    assert_eq!(console.state(), LoopState::Stopped);
    assert_eq!(console.exit(), None);
    assert_eq!(*failures.lock(), vec![io::ErrorKind::BrokenPipe]);
}

/// Console whose first read fails; later reads come from a script
struct FlakyTerminal {
    failed_once: bool,
    input: Vec<&'static str>,
    output: Arc<Mutex<String>>,
}

impl LineSource for FlakyTerminal {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.output.lock().push_str(prompt);
        if !self.failed_once {
            self.failed_once = true;
            return Err(io::Error::new(io::ErrorKind::Interrupted, "read interrupted"));
        }
        if self.input.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.input.remove(0).to_string()))
        }
    }

    fn print(&mut self, text: &str) -> io::Result<()> {
        self.output.lock().push_str(text);
        Ok(())
    }
}

#[test]
fn test_failed_request_read_leaves_loop_running() {
    let queue = RequestQueue::new();
    let failures = Arc::new(Mutex::new(Vec::new()));
    {
        let failures = failures.clone();
        queue.enqueue_read_line(
            |_| panic!("read should not succeed"),
            move |err| failures.lock().push(err.kind()),
        );
    }
    let output = Arc::new(Mutex::new(String::new()));
    let terminal = FlakyTerminal {
        failed_once: false,
        input: vec!["1"],
        output: output.clone(),
    };
    let actor = EventLoopActor::spawn(queue.clone(), vec![]).unwrap();
    let mut console = ConsoleEventLoop::new(
        terminal,
        LangParser,
        SynchronousBridge::new(actor),
        queue,
        ShellConfig::default(),
    );

    assert_eq!(console.run().unwrap(), LoopExit::EndOfInput);
    assert_eq!(*failures.lock(), vec![io::ErrorKind::Interrupted]);
    assert_eq!(*output.lock(), ">>>1\n>");
}

#[test]
fn test_error_inside_call_argument_names_the_call() {
    let (_, output) = session("print(1 / 0)\n2\n", quiet());
    assert_eq!(
        output,
        "division by zero\n  at '/' at console:1\n  at print() at console:1\n2\n"
    );
}

/// Loses units named "lose" by dropping their completion
struct Lossy;

impl ActorHandle for Lossy {
    type Unit = String;

    fn submit(&self, unit: String, on_complete: Completion) -> Result<(), ActorError> {
        thread::spawn(move || {
            if unit != "lose" {
                on_complete(Ok(unit));
            }
        });
        Ok(())
    }
}

#[test]
fn test_lost_unit_is_reported_and_loop_continues() {
    let (source, output) = scripted("lose\nkept\n");
    let mut console = ConsoleEventLoop::new(
        source,
        RawParser,
        SynchronousBridge::new(Lossy),
        RequestQueue::new(),
        quiet(),
    );

    assert_eq!(console.run().unwrap(), LoopExit::EndOfInput);
    assert_eq!(
        output.contents(),
        "actor dropped the unit without completing it\nkept\n"
    );
}
