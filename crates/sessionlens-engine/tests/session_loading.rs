// Integration tests for the complete flow: transcript files on disk ->
// adapter streams -> session loading with cross-file usage dedup.
use sessionlens_engine::{SpanKind, load_session_events, summarize_session, total_usage};
use sessionlens_providers::{ClaudeAdapter, CodexAdapter, LogAdapter};
use sessionlens_types::{CancelToken, SessionMeta};
use std::path::Path;

fn claude_assistant_line(message_id: &str, ts: &str, input_tokens: u64) -> String {
    format!(
        r#"{{"type":"assistant","uuid":"u-{id}","sessionId":"s1","timestamp":"{ts}","message":{{"id":"{id}","role":"assistant","content":[{{"type":"text","text":"working on it"}}],"usage":{{"input_tokens":{input},"output_tokens":10}}}}}}"#,
        id = message_id,
        ts = ts,
        input = input_tokens,
    )
}

fn write(path: &Path, lines: &[String]) {
    std::fs::write(path, lines.join("\n") + "\n").unwrap();
}

#[test]
fn usage_for_a_message_repeated_across_files_counts_once() {
    let dir = tempfile::tempdir().unwrap();
    let file_a = dir.path().join("a.jsonl");
    let file_b = dir.path().join("b.jsonl");

    // msg_1 appears in both files of the same session; msg_2 only in b
    write(
        &file_a,
        &[claude_assistant_line("msg_1", "2025-03-01T10:00:00Z", 100)],
    );
    write(
        &file_b,
        &[
            claude_assistant_line("msg_1", "2025-03-01T10:00:00Z", 100),
            claude_assistant_line("msg_2", "2025-03-01T10:01:00Z", 40),
        ],
    );

    let mut meta = SessionMeta::new("s1", file_a);
    meta.source_files.push(file_b);

    let (events, report) = load_session_events(&ClaudeAdapter, &meta, &CancelToken::new());
    assert_eq!(report.files_read, 2);
    assert_eq!(report.files_failed, 0);

    let usage = total_usage(&events);
    assert_eq!(usage.input_tokens, 140);
    assert_eq!(usage.output_tokens, 20);
}

#[test]
fn unreadable_file_is_counted_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let file_a = dir.path().join("a.jsonl");
    write(
        &file_a,
        &[claude_assistant_line("msg_1", "2025-03-01T10:00:00Z", 100)],
    );

    let mut meta = SessionMeta::new("s1", file_a);
    meta.source_files.push(dir.path().join("vanished.jsonl"));

    let (events, report) = load_session_events(&ClaudeAdapter, &meta, &CancelToken::new());
    assert_eq!(report.files_read, 1);
    assert_eq!(report.files_failed, 1);
    assert!(!events.is_empty());
}

#[test]
fn codex_end_to_end_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollout.jsonl");
    write(
        &path,
        &[
            r#"{"timestamp":"2025-03-01T10:00:00Z","type":"session_meta","payload":{"id":"sess-x","timestamp":"2025-03-01T10:00:00Z","cwd":"/home/user/proj"}}"#.to_string(),
            r#"{"timestamp":"2025-03-01T10:00:00Z","type":"response_item","payload":{"type":"message","role":"user","content":[{"type":"input_text","text":"build it"}]}}"#.to_string(),
            r#"{"timestamp":"2025-03-01T10:00:01Z","type":"response_item","payload":{"type":"function_call","name":"shell","arguments":"{}","call_id":"c1"}}"#.to_string(),
            r#"{"timestamp":"2025-03-01T10:00:05Z","type":"response_item","payload":{"type":"function_call_output","call_id":"c1","output":"ok\nExit code: 0"}}"#.to_string(),
            r#"{"timestamp":"2025-03-01T10:00:06Z","type":"response_item","payload":{"type":"message","role":"assistant","content":[{"type":"output_text","text":"built"}]}}"#.to_string(),
            r#"{"timestamp":"2025-03-01T10:00:06.100Z","type":"event_msg","payload":{"type":"token_count","info":{"total_token_usage":{"input_tokens":100,"output_tokens":0,"total_tokens":100}}}}"#.to_string(),
            r#"{"timestamp":"2025-03-01T10:00:12Z","type":"event_msg","payload":{"type":"token_count","info":{"total_token_usage":{"input_tokens":180,"output_tokens":0,"total_tokens":180}}}}"#.to_string(),
        ],
    );

    let meta = CodexAdapter.read_header(&path).unwrap().unwrap();
    assert_eq!(meta.id, "sess-x");

    let (events, _) = load_session_events(&CodexAdapter, &meta, &CancelToken::new());
    let summary = summarize_session(&meta, &events);

    assert_eq!(summary.duration_ms, 12_000);
    assert_eq!(summary.token_usage.input_tokens, 180);
    assert_eq!(summary.event_counts.tool_calls, 1);
    assert_eq!(summary.event_counts.tool_results, 1);

    // trace tiles the window and contains a ~4s tool span
    let span_total: u64 = summary.trace.iter().map(|s| s.duration_ms).sum();
    assert_eq!(span_total, 12_000);
    assert!(
        summary
            .trace
            .iter()
            .any(|s| s.kind == SpanKind::Tool && s.duration_ms == 4_000)
    );

    // timeline preserves per-kind totals
    let timeline_messages: u32 = summary.timeline.iter().map(|b| b.messages).sum();
    assert_eq!(timeline_messages, 2);
}
