// tests/interpret_failures.rs

use std::io;
use std::time::Duration;

use pio_mcp::diagnostic::{ErrorKind, from_execution, from_tool_failure, malformed_output};
use pio_mcp::exec::ExecutionFailure;
use pio_mcp::interpret::{
    FALLBACK_LINES, Interpretation, Interpreter, MAX_DIAGNOSTICS, SignatureKind, SignatureTable,
    ToolFailure, interpret,
};
use pio_mcp_test_utils::outcome;

fn failure_of(stdout: &str, stderr: &str, code: i32) -> ToolFailure {
    match interpret(outcome(code, stdout, stderr)) {
        Interpretation::Failure(f) => f,
        Interpretation::Success { .. } => panic!("exit {code} must be a failure"),
    }
}

#[test]
fn exit_zero_passes_stdout_through_untouched() {
    let stdout = "[{\"id\": \"uno\"}]\n";
    match interpret(outcome(0, stdout, "some warning on stderr")) {
        Interpretation::Success { stdout: out, .. } => assert_eq!(out, stdout),
        Interpretation::Failure(f) => panic!("unexpected failure: {f:?}"),
    }
}

#[test]
fn port_error_maps_to_operation_failed_with_port_hint() {
    let failure = failure_of("", "Error: Could not open port /dev/ttyUSB0\n", 1);
    assert_eq!(failure.primary, Some(SignatureKind::PortUnavailable));
    assert!(failure.primary.is_some_and(SignatureKind::is_port_related));

    let err = from_tool_failure(failure);
    assert_eq!(err.kind, ErrorKind::OperationFailed);
    assert_eq!(
        err.diagnostics,
        vec!["Error: Could not open port /dev/ttyUSB0".to_string()]
    );
    let hint = err.hint.unwrap_or_default();
    assert!(hint.contains("port"), "hint: {hint}");
    assert_eq!(err.context.get("exit_code").map(String::as_str), Some("1"));
    assert!(err.message.contains("status 1"));
}

#[test]
fn busy_port_wins_over_later_generic_lines() {
    let stderr = "\
Looking for upload port...
Uploading .pio/build/uno/firmware.hex
avrdude: ser_open(): can't open device \"/dev/ttyACM0\": Device or resource busy
*** [upload] Error 1
";
    let failure = failure_of("", stderr, 1);
    assert_eq!(failure.primary, Some(SignatureKind::PortBusy));
    let lines = failure.lines();
    assert!(lines.iter().any(|l| l.contains("resource busy")));
    // CompileError's `*** [x] Error N` also matched and is kept in order.
    assert_eq!(lines.last().map(String::as_str), Some("*** [upload] Error 1"));
}

#[test]
fn compiler_errors_on_stdout_are_found_when_stderr_is_empty() {
    let stdout = "\
Compiling .pio/build/uno/src/main.cpp.o
src/main.cpp:5:3: error: 'foo' was not declared in this scope
src/main.cpp:9:1: error: expected ';' before '}' token
compilation terminated.
*** [.pio/build/uno/src/main.cpp.o] Error 1
========================= [FAILED] Took 1.23 seconds =========================
";
    let failure = failure_of(stdout, "", 1);
    assert_eq!(failure.primary, Some(SignatureKind::CompileError));
    assert_eq!(failure.diagnostics.len(), 4);
    assert!(failure.lines()[0].starts_with("src/main.cpp:5:3: error"));

    let err = from_tool_failure(failure);
    assert_eq!(err.kind, ErrorKind::OperationFailed);
    assert_eq!(err.context.get("signature").map(String::as_str), Some("compile error"));
}

#[test]
fn duplicate_lines_are_reported_once_and_capped() {
    let mut stderr = String::new();
    for i in 0..50 {
        stderr.push_str(&format!("src/f{i}.c:1:1: error: bad\n"));
        stderr.push_str(&format!("src/f{i}.c:1:1: error: bad\n"));
    }
    let failure = failure_of("", &stderr, 1);
    assert_eq!(failure.diagnostics.len(), MAX_DIAGNOSTICS);
    assert_eq!(failure.lines()[0], "src/f0.c:1:1: error: bad");
    assert_eq!(failure.lines()[1], "src/f1.c:1:1: error: bad");
}

#[test]
fn unmatched_output_falls_back_to_trailing_lines() {
    let stderr = "first\nsecond\n\nthird\nfourth\n\n";
    let failure = failure_of("", stderr, 2);
    assert_eq!(failure.primary, None);
    assert_eq!(failure.diagnostics.len(), FALLBACK_LINES);
    assert_eq!(failure.lines(), vec!["second", "third", "fourth"]);
    assert!(failure.diagnostics.iter().all(|d| d.kind.is_none()));
}

#[test]
fn ansi_colour_codes_are_stripped() {
    let failure = failure_of("", "\x1b[31mError: Unknown board ID 'Uno'\x1b[0m\n", 1);
    assert_eq!(failure.primary, Some(SignatureKind::UnknownBoard));
    assert_eq!(failure.lines(), vec!["Error: Unknown board ID 'Uno'"]);
}

#[test]
fn escape_only_stderr_falls_back_to_stdout() {
    let f = failure_of("Error: Unknown board ID 'unoo'\n", "\x1b[0m\n", 1);
    assert_eq!(f.lines(), vec!["Error: Unknown board ID 'unoo'"]);
}

#[test]
fn unreadable_stderr_still_yields_one_escaped_line() {
    let f = failure_of("", "\x1b[0m\n", 2);
    assert_eq!(f.diagnostics.len(), 1);
    assert_eq!(f.diagnostics[0].kind, None);
    assert!(f.diagnostics[0].line.contains("\\u{1b}[0m"));

    let f = failure_of("", "   \n", 2);
    assert_eq!(f.lines(), vec!["\"   \\n\""]);
}

#[test]
fn exit_127_means_tool_not_installed() {
    let err = from_tool_failure(failure_of("", "sh: 1: pio: not found\n", 127));
    assert_eq!(err.kind, ErrorKind::ToolNotInstalled);
}

#[test]
fn command_not_found_signature_means_tool_not_installed() {
    let err = from_tool_failure(failure_of("", "bash: platformio: command not found\n", 1));
    assert_eq!(err.kind, ErrorKind::ToolNotInstalled);
    assert!(err.hint.is_some());
}

#[test]
fn unknown_environment_has_specific_hint() {
    let err = from_tool_failure(failure_of(
        "",
        "Error: Unknown environment names 'esp32'. Valid names are 'uno'\n",
        1,
    ));
    assert_eq!(err.kind, ErrorKind::OperationFailed);
    assert_eq!(
        err.hint.as_deref(),
        Some(SignatureKind::UnknownEnvironment.hint())
    );
}

#[test]
fn custom_table_is_consulted_in_order() {
    let table = SignatureTable::new()
        .with(SignatureKind::NetworkError, "registry down")
        .unwrap()
        .with(SignatureKind::PackageNotFound, "registry")
        .unwrap();
    let interpreter = Interpreter::new(&table);
    let (diags, primary) = interpreter.extract("REGISTRY DOWN right now");
    assert_eq!(primary, Some(SignatureKind::NetworkError));
    assert_eq!(diags.len(), 1);
}

#[test]
fn execution_failures_classify_to_their_own_kinds() {
    let timeout = Duration::from_secs(30);

    let err = from_execution(
        ExecutionFailure::Timeout {
            elapsed: Duration::from_millis(30_010),
        },
        timeout,
    );
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert!(err.message.contains("30"));
    assert_eq!(err.context.get("elapsed_ms").map(String::as_str), Some("30010"));

    let err = from_execution(
        ExecutionFailure::SpawnFailed {
            program: "pio".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        },
        timeout,
    );
    assert_eq!(err.kind, ErrorKind::ToolNotInstalled);

    let err = from_execution(
        ExecutionFailure::SpawnFailed {
            program: "pio".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        },
        timeout,
    );
    assert_eq!(err.kind, ErrorKind::ToolNotInstalled);

    let err = from_execution(
        ExecutionFailure::MissingWorkDir {
            dir: "/srv/firmware".into(),
        },
        timeout,
    );
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.context.get("cwd").map(String::as_str), Some("/srv/firmware"));

    let err = from_execution(ExecutionFailure::Cancelled, timeout);
    assert_eq!(err.kind, ErrorKind::Cancelled);
}

#[test]
fn malformed_output_carries_a_bounded_excerpt() {
    let stdout = "x".repeat(1000);
    let err = malformed_output("a list of boards", "expected value", &stdout);
    assert_eq!(err.kind, ErrorKind::MalformedOutput);
    assert_eq!(err.context["output_excerpt"].len(), 200);
}

#[test]
fn rendered_error_shows_kind_details_and_hint() {
    let err = from_tool_failure(failure_of("", "Error: Could not open port COM4\n", 1));
    let text = err.render();
    assert!(text.starts_with("[OperationFailed]"));
    assert!(text.contains("Details:\n  Error: Could not open port COM4"));
    assert!(text.contains("Hint: "));
}
