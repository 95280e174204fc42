// Integration tests for the streaming path: transcript file on disk ->
// EventIter -> canonical events, with per-line skip accounting.
use sessionlens_providers::{ClaudeAdapter, CodexAdapter, LogAdapter};
use sessionlens_types::{CancelToken, EventKind};
use std::path::PathBuf;

fn write_fixture(lines: &[&str]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.jsonl");
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    (dir, path)
}

#[test]
fn codex_file_streams_events_and_counts_skips() {
    let (_dir, path) = write_fixture(&[
        r#"{"timestamp":"2025-03-01T10:00:00Z","type":"session_meta","payload":{"id":"abc","timestamp":"2025-03-01T10:00:00Z","cwd":"/home/user/proj"}}"#,
        r#"{"timestamp":"2025-03-01T10:00:01Z","type":"response_item","payload":{"type":"message","role":"user","content":[{"type":"input_text","text":"list files"}]}}"#,
        "this line is not json",
        r#"{"timestamp":"2025-03-01T10:00:02Z","type":"response_item","payload":{"type":"function_call","name":"shell","arguments":"{\"command\":[\"ls\"]}","call_id":"c1"}}"#,
        r#"{"timestamp":"2025-03-01T10:00:06Z","type":"response_item","payload":{"type":"function_call_output","call_id":"c1","output":"src\nExit code: 0"}}"#,
        r#"{"timestamp":"2025-03-01T10:00:07Z","type":"response_item","payload":{"type":"message","role":"assistant","content":[{"type":"output_text","text":"done"}]}}"#,
        r#"{"timestamp":"2025-03-01T10:00:08Z","type":"event_msg","payload":{"type":"token_count","info":{"total_token_usage":{"input_tokens":120,"cached_input_tokens":20,"output_tokens":40,"total_tokens":160}}}}"#,
    ]);

    let mut iter = CodexAdapter.events(&path, CancelToken::new()).unwrap();
    let events: Vec<_> = iter.by_ref().collect();

    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Message,
            EventKind::ToolCall,
            EventKind::ToolResult,
            EventKind::Message,
            EventKind::TokenUsage,
        ]
    );

    let stats = iter.stats();
    assert_eq!(stats.lines_read, 7);
    assert_eq!(stats.lines_skipped, 1);
}

#[test]
fn claude_file_streams_events() {
    let (_dir, path) = write_fixture(&[
        r#"{"type":"user","uuid":"u1","sessionId":"s1","timestamp":"2025-03-01T10:00:00Z","cwd":"/home/user/proj","message":{"role":"user","content":"hello"}}"#,
        r#"{"type":"assistant","uuid":"u2","sessionId":"s1","timestamp":"2025-03-01T10:00:03Z","message":{"id":"msg_1","role":"assistant","content":[{"type":"text","text":"hi"}],"usage":{"input_tokens":12,"output_tokens":4}}}"#,
    ]);

    let iter = ClaudeAdapter.events(&path, CancelToken::new()).unwrap();
    let events: Vec<_> = iter.collect();
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![EventKind::Message, EventKind::Message, EventKind::TokenUsage]
    );
}

#[test]
fn bom_prefixed_first_line_parses() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bom.jsonl");
    let line = "\u{feff}{\"type\":\"user\",\"uuid\":\"u1\",\"sessionId\":\"s1\",\"timestamp\":\"2025-03-01T10:00:00Z\",\"message\":{\"role\":\"user\",\"content\":\"hi\"}}\n";
    std::fs::write(&path, line).unwrap();

    let mut iter = ClaudeAdapter.events(&path, CancelToken::new()).unwrap();
    let events: Vec<_> = iter.by_ref().collect();
    assert_eq!(events.len(), 1);
    assert_eq!(iter.stats().lines_skipped, 0);
}

#[test]
fn restarting_the_iterator_replays_the_file() {
    let (_dir, path) = write_fixture(&[
        r#"{"type":"user","uuid":"u1","sessionId":"s1","timestamp":"2025-03-01T10:00:00Z","message":{"role":"user","content":"hi"}}"#,
    ]);

    let first: Vec<_> = ClaudeAdapter
        .events(&path, CancelToken::new())
        .unwrap()
        .collect();
    let second: Vec<_> = ClaudeAdapter
        .events(&path, CancelToken::new())
        .unwrap()
        .collect();
    assert_eq!(first.len(), second.len());
}

#[test]
fn cancelled_stream_yields_nothing() {
    let (_dir, path) = write_fixture(&[
        r#"{"type":"user","uuid":"u1","sessionId":"s1","timestamp":"2025-03-01T10:00:00Z","message":{"role":"user","content":"hi"}}"#,
    ]);

    let cancel = CancelToken::new();
    cancel.cancel();
    let events: Vec<_> = ClaudeAdapter.events(&path, cancel).unwrap().collect();
    assert!(events.is_empty());
}
