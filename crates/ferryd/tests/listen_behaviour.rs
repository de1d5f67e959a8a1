//! End-to-end dispatch loop behaviour over in-memory IO.

#![expect(
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "tests use expect and direct indexing for clarity"
)]

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use rstest::rstest;
use serde_json::{Value, json};

use ferry_protocol::Severity;
use ferryd::{
    CaseError, CaseFactory, CaseHandle, EnvelopeWriter, HandlerCatalogue, HandlerError,
    Invocation, LineInput, Listener, PlaceholderCaseFactory,
};

const DONE: &str = r#"{"cmd":"done"}"#;

struct ListenOutcome {
    status: i32,
    out: Vec<Value>,
    err: Vec<Value>,
}

impl ListenOutcome {
    /// Flattens output envelopes into `kind:detail` strings for ordering
    /// assertions.
    fn summary(&self) -> Vec<String> {
        self.out
            .iter()
            .map(|envelope| {
                if let Some(log) = envelope.get("log") {
                    format!(
                        "log:{}:{}",
                        log["severity"].as_str().unwrap_or_default(),
                        log["message"].as_str().unwrap_or_default()
                    )
                } else if let Some(result) = envelope.get("result") {
                    format!("result:{}", result["data"])
                } else if let Some(entity) = envelope.get("entity") {
                    format!("entity:{entity}")
                } else {
                    format!("other:{envelope}")
                }
            })
            .collect()
    }

    fn error_messages(&self) -> Vec<String> {
        self.err
            .iter()
            .map(|envelope| {
                envelope["error"]["message"]
                    .as_str()
                    .unwrap_or_default()
                    .to_owned()
            })
            .collect()
    }
}

fn parse_lines(channel: Vec<u8>) -> Vec<Value> {
    String::from_utf8(channel)
        .expect("utf8 channel")
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid envelope line"))
        .collect()
}

fn run_listen_with(
    catalogue: HandlerCatalogue,
    factory: Box<dyn CaseFactory>,
    threshold: Severity,
    lines: &[&str],
) -> ListenOutcome {
    let text = if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    };
    let input = LineInput::new(Cursor::new(text));
    let sink = EnvelopeWriter::new(Vec::new(), Vec::new(), threshold);
    let mut listener = Listener::new(input, sink, catalogue, factory);
    let status = listener.run();
    let (out, err) = listener.into_sink().into_parts();
    ListenOutcome {
        status,
        out: parse_lines(out),
        err: parse_lines(err),
    }
}

fn run_listen(lines: &[&str]) -> ListenOutcome {
    run_listen_with(
        test_catalogue(),
        Box::new(PlaceholderCaseFactory),
        Severity::Info,
        lines,
    )
}

/// Built-in catalogue extended with fixed-value and failing handlers.
fn test_catalogue() -> HandlerCatalogue {
    let mut catalogue = HandlerCatalogue::builtin();
    catalogue.insert(
        "greet_hi",
        false,
        |_invocation: Invocation<'_>| -> Result<Value, HandlerError> { Ok(json!("hi")) },
    );
    catalogue.insert(
        "greet_hello",
        false,
        |_invocation: Invocation<'_>| -> Result<Value, HandlerError> { Ok(json!("hello")) },
    );
    catalogue.insert(
        "explode",
        false,
        |_invocation: Invocation<'_>| -> Result<Value, HandlerError> {
            Err(HandlerError::with_stack("boom", "at explode"))
        },
    );
    catalogue
}

#[test]
fn logs_start_and_end_messages() {
    let outcome = run_listen(&[DONE]);
    assert_eq!(outcome.status, 0);
    assert_eq!(outcome.summary(), vec!["log:info:Starting", "log:info:Finished"]);
    assert!(outcome.err.is_empty());
}

#[test]
fn runs_function_and_returns_a_result_message() {
    let outcome = run_listen(&[r#"{"cmd":"get_result","def":"greet_hello"}"#, DONE]);
    assert_eq!(outcome.status, 0);
    assert_eq!(
        outcome.summary(),
        vec![
            "log:info:Starting",
            "result:\"hello\"",
            "log:info:Finished"
        ]
    );
}

#[test]
fn uses_stored_def_to_run_same_function() {
    let outcome = run_listen(&[
        r#"{"cmd":"get_result","def":"greet_hi"}"#,
        r#"{"cmd":"get_result"}"#,
        DONE,
    ]);
    assert_eq!(outcome.status, 0);
    assert_eq!(
        outcome.summary(),
        vec![
            "log:info:Starting",
            "result:\"hi\"",
            "result:\"hi\"",
            "log:info:Finished"
        ]
    );
}

#[test]
fn replaces_a_function_when_a_new_def_is_provided() {
    let outcome = run_listen_with(
        test_catalogue(),
        Box::new(PlaceholderCaseFactory),
        Severity::Debug,
        &[
            r#"{"cmd":"get_result","def":"greet_hi"}"#,
            r#"{"cmd":"get_result","def":"greet_hello"}"#,
            DONE,
        ],
    );
    assert_eq!(outcome.status, 0);
    let summary = outcome.summary();
    assert!(summary.contains(&"log:debug:Adding new function for 'get_result'".to_owned()));
    assert!(summary.contains(&"log:debug:Replacing function for 'get_result'".to_owned()));
    let results: Vec<&String> = summary
        .iter()
        .filter(|line| line.starts_with("result:"))
        .collect();
    assert_eq!(results, ["result:\"hi\"", "result:\"hello\""]);
}

#[test]
fn passes_args_to_the_function() {
    let outcome = run_listen(&[
        r#"{"cmd":"get_result","def":"concat","args":{"1":"hello","2":"there!"}}"#,
        r#"{"cmd":"get_result","args":{"1":"bye"}}"#,
        DONE,
    ]);
    assert_eq!(outcome.status, 0);
    let results: Vec<String> = outcome
        .summary()
        .into_iter()
        .filter(|line| line.starts_with("result:"))
        .collect();
    assert_eq!(results, ["result:\"hello there!\"", "result:\"bye\""]);
}

#[test]
fn redirects_input_to_the_datastream_when_isstream_is_true() {
    let outcome = run_listen(&[
        r#"{"cmd":"process_stream","isstream":true,"def":"log_stream"}"#,
        "abc-123", // start token
        "data1",
        "data2",
        "abc-123", // end token
        DONE,
    ]);
    assert_eq!(outcome.status, 0);
    assert_eq!(
        outcome.summary(),
        vec![
            "log:info:Starting",
            "log:info:Received: data1",
            "log:info:Received: data2",
            "result:null",
            "log:info:Finished"
        ]
    );
}

#[test]
fn stream_lines_are_observed_exactly_and_in_order() {
    let outcome = run_listen(&[
        r#"{"cmd":"collect","isstream":true,"def":"collect_stream"}"#,
        "end-tok",
        "first",
        "second",
        "third",
        "end-tok",
        DONE,
    ]);
    assert_eq!(outcome.status, 0);
    let results: Vec<String> = outcome
        .summary()
        .into_iter()
        .filter(|line| line.starts_with("result:"))
        .collect();
    assert_eq!(results, [r#"result:["first","second","third"]"#]);
}

#[test]
fn does_not_redirect_input_when_isstream_is_absent() {
    let outcome = run_listen(&[
        r#"{"cmd":"process_stream","def":"log_stream"}"#,
        r#"{"cmd":"process_stream"}"#,
        DONE,
    ]);
    assert_eq!(outcome.status, 0);
    assert_eq!(
        outcome.summary(),
        vec![
            "log:info:Starting",
            "result:null",
            "result:null",
            "log:info:Finished"
        ]
    );
}

#[test]
fn caller_supplied_datastream_arg_is_superseded_by_the_live_stream() {
    let outcome = run_listen(&[
        r#"{"cmd":"process_stream","isstream":true,"def":"log_stream","args":{"datastream":""}}"#,
        "abc-123",
        "data1",
        "abc-123",
        DONE,
    ]);
    assert_eq!(outcome.status, 0);
    assert_eq!(
        outcome.summary(),
        vec![
            "log:info:Starting",
            "log:info:Received: data1",
            "result:null",
            "log:info:Finished"
        ]
    );
}

#[test]
fn emits_entity_envelopes_from_handlers() {
    let outcome = run_listen(&[
        r#"{"cmd":"describe","def":"emit_entity","args":{"name":"item-1"}}"#,
        DONE,
    ]);
    assert_eq!(outcome.status, 0);
    assert_eq!(
        outcome.summary(),
        vec![
            "log:info:Starting",
            r#"entity:{"name":"item-1"}"#,
            "result:null",
            "log:info:Finished"
        ]
    );
}

#[test]
fn writes_error_and_continues_when_json_cannot_be_parsed() {
    let outcome = run_listen(&[r#"{"cmd":"}"#, DONE]);
    assert_eq!(outcome.status, 0);
    assert_eq!(
        outcome.error_messages(),
        vec![r#"Could not parse JSON: {"cmd":"}"#]
    );
    let summary = outcome.summary();
    assert!(summary.contains(&r#"log:error:Could not parse JSON: {"cmd":"}"#.to_owned()));
    assert_eq!(summary.last(), Some(&"log:info:Finished".to_owned()));
}

#[test]
fn terminates_when_a_function_definition_is_not_found() {
    let outcome = run_listen(&[r#"{"cmd":"unknown"}"#]);
    assert_eq!(outcome.status, 1);
    assert_eq!(
        outcome.error_messages(),
        vec!["Function definition for 'unknown' not found"]
    );
    let summary = outcome.summary();
    assert!(
        summary.contains(&"log:error:Function definition for 'unknown' not found".to_owned())
    );
    assert!(!summary.contains(&"log:info:Finished".to_owned()));
}

#[test]
fn terminates_when_the_catalogue_key_is_unknown() {
    let outcome = run_listen(&[r#"{"cmd":"x","def":"no_such_handler"}"#]);
    assert_eq!(outcome.status, 1);
    assert_eq!(
        outcome.error_messages(),
        vec!["Could not register function for 'x': no handler named 'no_such_handler'"]
    );
}

#[test]
fn terminates_when_a_function_cannot_be_executed() {
    let outcome = run_listen(&[r#"{"cmd":"get_result","def":"explode"}"#]);
    assert_eq!(outcome.status, 1);
    assert_eq!(
        outcome.error_messages(),
        vec!["Could not execute get_result: boom"]
    );
    let report = &outcome.err[0]["error"];
    assert_eq!(report["stackTrace"], json!("at explode"));
}

#[test]
fn terminates_when_streaming_into_a_non_stream_handler() {
    let outcome = run_listen(&[
        r#"{"cmd":"get_result","def":"greet_hi"}"#,
        r#"{"cmd":"get_result","isstream":true}"#,
    ]);
    assert_eq!(outcome.status, 1);
    assert_eq!(
        outcome.error_messages(),
        vec!["The function 'get_result' does not support data streaming"]
    );
}

#[test]
fn terminates_when_input_closes_before_the_sentinel() {
    let outcome = run_listen(&[]);
    assert_eq!(outcome.status, 2);
    assert_eq!(
        outcome.error_messages(),
        vec!["input closed before the termination command"]
    );
}

#[rstest]
#[case(Severity::Info, false)]
#[case(Severity::Debug, true)]
fn severity_threshold_controls_reader_debug_logs(
    #[case] threshold: Severity,
    #[case] expect_debug: bool,
) {
    let outcome = run_listen_with(
        test_catalogue(),
        Box::new(PlaceholderCaseFactory),
        threshold,
        &[DONE],
    );
    let has_debug = outcome
        .summary()
        .iter()
        .any(|line| line.starts_with("log:debug:reader:"));
    assert_eq!(has_debug, expect_debug);
}

/// Case factory recording transitions for lifecycle assertions.
#[derive(Clone, Default)]
struct RecordingFactory {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingFactory {
    fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }
}

impl CaseFactory for RecordingFactory {
    fn open(&self, path: &str) -> Result<Box<dyn CaseHandle>, CaseError> {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("open:{path}"));
        Ok(Box::new(RecordingCase {
            path: path.to_owned(),
            events: Arc::clone(&self.events),
        }))
    }
}

struct RecordingCase {
    path: String,
    events: Arc<Mutex<Vec<String>>>,
}

impl CaseHandle for RecordingCase {
    fn location_path(&self) -> String {
        self.path.clone()
    }

    fn close(self: Box<Self>) -> Result<(), CaseError> {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("close:{}", self.path));
        Ok(())
    }
}

#[test]
fn case_lifecycle_follows_the_casepath_field() {
    let factory = RecordingFactory::default();
    let outcome = run_listen_with(
        test_catalogue(),
        Box::new(factory.clone()),
        Severity::Info,
        &[
            r#"{"cmd":"work","def":"greet_hi","casepath":"/data/case1"}"#,
            r#"{"cmd":"work","casepath":"\\data\\case1"}"#,
            r#"{"cmd":"work","casepath":"/data/case2"}"#,
            DONE,
        ],
    );
    assert_eq!(outcome.status, 0);
    assert_eq!(
        factory.events(),
        vec![
            "open:/data/case1",
            "close:/data/case1",
            "open:/data/case2",
            "close:/data/case2"
        ]
    );
    let summary = outcome.summary();
    assert!(summary.contains(&"log:info:Another Case is open".to_owned()));
    assert!(summary.contains(&"log:info:Opening case: /data/case1".to_owned()));
    assert!(summary.contains(&"log:info:Closing case: /data/case1".to_owned()));
    assert!(summary.contains(&"log:info:Opening case: /data/case2".to_owned()));
    // the sentinel path releases the last open case before "Finished"
    assert!(summary.contains(&"log:info:Closing case: /data/case2".to_owned()));
    assert_eq!(summary.last(), Some(&"log:info:Finished".to_owned()));
}

#[test]
fn no_response_is_emitted_for_the_sentinel_line() {
    let outcome = run_listen(&[r#"{"cmd":"get_result","def":"greet_hi"}"#, DONE]);
    let results = outcome
        .summary()
        .into_iter()
        .filter(|line| line.starts_with("result:"))
        .count();
    assert_eq!(results, 1);
}
