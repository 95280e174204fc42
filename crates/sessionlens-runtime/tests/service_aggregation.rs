// Service-level aggregation over a transcript tree on disk.
use sessionlens_providers::{ClaudeAdapter, CodexAdapter};
use sessionlens_runtime::{ScanEvent, TelemetryService, ToolSource};
use sessionlens_types::CancelToken;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

fn write_codex_session(root: &Path, name: &str, id: &str, input_tokens: u64) {
    std::fs::create_dir_all(root).unwrap();
    let lines = [
        format!(
            r#"{{"timestamp":"2025-03-01T10:00:00Z","type":"session_meta","payload":{{"id":"{}","timestamp":"2025-03-01T10:00:00Z","cwd":"/home/user/proj"}}}}"#,
            id
        ),
        format!(
            r#"{{"timestamp":"2025-03-01T10:00:05Z","type":"event_msg","payload":{{"type":"token_count","info":{{"total_token_usage":{{"input_tokens":{},"output_tokens":10,"total_tokens":{}}}}}}}}}"#,
            input_tokens,
            input_tokens + 10
        ),
    ];
    std::fs::write(root.join(name), lines.join("\n") + "\n").unwrap();
}

fn write_claude_session(root: &Path, name: &str, id: &str, input_tokens: u64) {
    std::fs::create_dir_all(root).unwrap();
    let line = format!(
        r#"{{"type":"assistant","uuid":"u1","sessionId":"{id}","timestamp":"2025-03-01T11:00:00Z","cwd":"/home/user/proj","message":{{"id":"msg-{id}","role":"assistant","content":[{{"type":"text","text":"ok"}}],"usage":{{"input_tokens":{input},"output_tokens":5}}}}}}"#,
        id = id,
        input = input_tokens,
    );
    std::fs::write(root.join(name), line + "\n").unwrap();
}

fn service_for(dir: &Path) -> TelemetryService {
    TelemetryService::from_sources(
        vec![
            ToolSource {
                adapter: Box::new(CodexAdapter),
                log_root: dir.join("codex"),
            },
            ToolSource {
                adapter: Box::new(ClaudeAdapter),
                log_root: dir.join("claude"),
            },
        ],
        Duration::from_secs(120),
    )
}

#[test]
fn total_usage_sums_across_tools() {
    let dir = tempfile::tempdir().unwrap();
    write_codex_session(&dir.path().join("codex"), "a.jsonl", "codex-1", 100);
    write_claude_session(&dir.path().join("claude"), "b.jsonl", "claude-1", 70);

    let service = service_for(dir.path());
    let cancel = CancelToken::new();
    let total = service.usage_total(false, &cancel, None).unwrap();

    assert_eq!(total.input_tokens, 170);
    assert_eq!(total.output_tokens, 15);
}

#[test]
fn missing_roots_yield_cached_zero_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_for(dir.path()); // neither root exists

    let cancel = CancelToken::new();
    let total = service.usage_total(false, &cancel, None).unwrap();
    assert!(total.is_zero());

    // second call hits the cache and stays zero
    let again = service.usage_total(false, &cancel, None).unwrap();
    assert!(again.is_zero());
}

#[test]
fn cancelled_aggregation_errors_and_caches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_codex_session(&dir.path().join("codex"), "a.jsonl", "codex-1", 100);

    let service = service_for(dir.path());
    let cancelled = CancelToken::new();
    cancelled.cancel();
    assert!(service.usage_total(false, &cancelled, None).is_err());

    // a fresh caller computes the real value: no partial entry was stored
    let cancel = CancelToken::new();
    let total = service.usage_total(false, &cancel, None).unwrap();
    assert_eq!(total.input_tokens, 100);
}

#[test]
fn progress_feed_reports_scan_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    write_codex_session(&dir.path().join("codex"), "a.jsonl", "codex-1", 100);
    write_claude_session(&dir.path().join("claude"), "b.jsonl", "claude-1", 70);

    let service = service_for(dir.path());
    let cancel = CancelToken::new();

    let events: Mutex<Vec<ScanEvent>> = Mutex::new(Vec::new());
    let hook = |event: ScanEvent| events.lock().unwrap().push(event);
    service.usage_total(true, &cancel, Some(&hook)).unwrap();

    let events = events.into_inner().unwrap();
    let started = events
        .iter()
        .filter(|e| matches!(e, ScanEvent::Started { .. }))
        .count();
    assert_eq!(started, 2);

    let summary = events
        .iter()
        .find_map(|e| match e {
            ScanEvent::Finished { summary } => Some(*summary),
            _ => None,
        })
        .expect("finished event with summary");
    assert_eq!(summary.sessions_found, 2);
    assert_eq!(summary.files_scanned, 2);
    assert_eq!(summary.files_failed, 0);
}

#[test]
fn list_sessions_filters_by_workspace_and_tool() {
    let dir = tempfile::tempdir().unwrap();
    write_codex_session(&dir.path().join("codex"), "a.jsonl", "codex-1", 100);
    write_claude_session(&dir.path().join("claude"), "b.jsonl", "claude-1", 70);

    let service = service_for(dir.path());
    let cancel = CancelToken::new();

    let all = service.list_sessions(None, None, &cancel);
    assert_eq!(all.len(), 2);

    let codex_only = service.list_sessions(None, Some("codex"), &cancel);
    assert_eq!(codex_only.len(), 1);
    assert_eq!(codex_only[0].tool, "codex");

    let in_workspace =
        service.list_sessions(Some(&PathBuf::from("/home/user/proj")), None, &cancel);
    assert_eq!(in_workspace.len(), 2);

    let elsewhere = service.list_sessions(Some(&PathBuf::from("/srv/other")), None, &cancel);
    assert!(elsewhere.is_empty());
}

#[test]
fn session_summary_and_messages_by_id() {
    let dir = tempfile::tempdir().unwrap();
    write_codex_session(&dir.path().join("codex"), "a.jsonl", "codex-1", 100);

    let service = service_for(dir.path());
    let cancel = CancelToken::new();

    let summary = service
        .session_summary("codex-1", &cancel)
        .unwrap()
        .expect("known session");
    assert_eq!(summary.id, "codex-1");
    assert_eq!(summary.token_usage.input_tokens, 100);

    assert!(service.session_summary("nope", &cancel).unwrap().is_none());

    let page = service
        .session_messages("codex-1", None, None, &cancel)
        .unwrap()
        .expect("known session");
    assert!(!page.has_more);
}
