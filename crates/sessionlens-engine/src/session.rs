use sessionlens_providers::LogAdapter;
use sessionlens_types::{CancelToken, EventPayload, SessionEvent, SessionMeta};
use std::collections::HashSet;

/// Per-session load accounting, returned alongside the events so callers
/// can surface partial failures instead of suppressing them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadReport {
    pub files_read: u64,
    pub files_failed: u64,
    pub lines_read: u64,
    pub lines_skipped: u64,
}

/// Load the full canonical event stream for one session.
///
/// Concatenates the session's source files in order and enforces the
/// cross-file usage rule here, once, so every downstream consumer sees a
/// delta-correct stream: a `TokenUsage` event tagged with a message id is
/// kept only on its first sighting across the whole session. Unreadable
/// files are counted and skipped; cancellation is honored between files
/// (and within files by the iterator itself).
pub fn load_session_events(
    adapter: &dyn LogAdapter,
    meta: &SessionMeta,
    cancel: &CancelToken,
) -> (Vec<SessionEvent>, LoadReport) {
    let mut events = Vec::new();
    let mut report = LoadReport::default();
    let mut seen_message_ids: HashSet<String> = HashSet::new();

    for file in &meta.source_files {
        if cancel.is_cancelled() {
            break;
        }

        let mut iter = match adapter.events(file, cancel.clone()) {
            Ok(iter) => iter,
            Err(_) => {
                report.files_failed += 1;
                continue;
            }
        };

        for event in iter.by_ref() {
            if let EventPayload::TokenUsage(usage) = &event.payload
                && let Some(message_id) = &usage.message_id
                && !seen_message_ids.insert(message_id.clone())
            {
                continue;
            }
            events.push(event);
        }

        let stats = iter.stats();
        report.files_read += 1;
        report.lines_read += stats.lines_read;
        report.lines_skipped += stats.lines_skipped;
    }

    (events, report)
}
