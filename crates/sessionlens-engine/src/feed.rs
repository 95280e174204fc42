use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sessionlens_providers::PendingTable;
use sessionlens_types::{EventKind, EventPayload, Role, SessionEvent};
use std::collections::HashMap;
use uuid::Uuid;

/// Entries closer together than this with an identical fingerprint are
/// treated as re-emissions of the same record.
const DEDUP_WINDOW_MS: i64 = 10;

const DEFAULT_PAGE_SIZE: usize = 30;
const MAX_PAGE_SIZE: usize = 200;

/// One row of the conversation view. Tool calls and their results merge
/// into a single entry keyed by the provider call id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntry {
    pub id: String,
    pub role: Role,
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_is_error: Option<bool>,
}

/// One page of the conversation, sliced backward from a cursor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePage {
    pub entries: Vec<MessageEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<usize>,
    pub has_more: bool,
}

/// Build the full deduplicated conversation view for one session.
///
/// Events are ordered by timestamp (stable on the original sequence for
/// ties), tool pairs merge through the pending table regardless of arrival
/// order, and exact re-emissions within 10 ms of a kept entry are dropped.
pub fn build_feed(session_id: &str, events: &[SessionEvent]) -> Vec<MessageEntry> {
    let namespace = Uuid::new_v5(&Uuid::NAMESPACE_OID, session_id.as_bytes());

    let mut ordered: Vec<(usize, &SessionEvent)> = events.iter().enumerate().collect();
    ordered.sort_by_key(|(seq, event)| (event.timestamp, *seq));

    let mut entries: Vec<MessageEntry> = Vec::new();
    // call id -> index of the entry awaiting its other half
    let mut pending: PendingTable<usize, usize> = PendingTable::new();

    let entry_id = |n: usize| Uuid::new_v5(&namespace, format!("entry:{}", n).as_bytes());

    for (_, event) in ordered {
        match &event.payload {
            EventPayload::User { text }
            | EventPayload::Assistant { text }
            | EventPayload::Reasoning { text } => {
                entries.push(MessageEntry {
                    id: entry_id(entries.len()).to_string(),
                    role: event.payload.role().unwrap_or(Role::Assistant),
                    kind: event.kind(),
                    text: Some(text.clone()),
                    timestamp: event.timestamp,
                    tool_name: None,
                    tool_call_id: None,
                    tool_input: None,
                    tool_output: None,
                    tool_is_error: None,
                });
            }

            EventPayload::ToolCall(call) => {
                let paired = call
                    .call_id
                    .as_ref()
                    .and_then(|id| pending.register_call(id, entries.len()));

                match paired {
                    Some(result_entry) => {
                        // Result surfaced first; fold the call into it
                        let entry = &mut entries[result_entry];
                        entry.kind = EventKind::ToolCall;
                        entry.tool_name = Some(call.name.clone());
                        entry.tool_input = Some(call.arguments.clone());
                    }
                    None => {
                        entries.push(MessageEntry {
                            id: entry_id(entries.len()).to_string(),
                            role: Role::Assistant,
                            kind: EventKind::ToolCall,
                            text: None,
                            timestamp: event.timestamp,
                            tool_name: Some(call.name.clone()),
                            tool_call_id: call.call_id.clone(),
                            tool_input: Some(call.arguments.clone()),
                            tool_output: None,
                            tool_is_error: None,
                        });
                    }
                }
            }

            EventPayload::ToolResult(result) => {
                match pending.register_result(&result.call_id, entries.len()) {
                    Some(call_entry) => {
                        let entry = &mut entries[call_entry];
                        entry.tool_output = Some(result.output.clone());
                        entry.tool_is_error = Some(result.is_error);
                    }
                    None => {
                        entries.push(MessageEntry {
                            id: entry_id(entries.len()).to_string(),
                            role: Role::Assistant,
                            kind: EventKind::ToolResult,
                            text: None,
                            timestamp: event.timestamp,
                            tool_name: result.tool_name.clone(),
                            tool_call_id: Some(result.call_id.clone()),
                            tool_input: None,
                            tool_output: Some(result.output.clone()),
                            tool_is_error: Some(result.is_error),
                        });
                    }
                }
            }

            EventPayload::TokenUsage(_) | EventPayload::Other => {}
        }
    }

    dedup_entries(entries)
}

/// Drop entries whose full fingerprint matches a previously kept entry
/// within the dedup window. Some tools re-emit identical records when a
/// session is resumed or split across files.
fn dedup_entries(entries: Vec<MessageEntry>) -> Vec<MessageEntry> {
    let mut kept: Vec<MessageEntry> = Vec::new();
    let mut last_kept_at: HashMap<String, DateTime<Utc>> = HashMap::new();

    for entry in entries {
        let fingerprint = fingerprint(&entry);
        if let Some(previous) = last_kept_at.get(&fingerprint) {
            let gap = (entry.timestamp - *previous).num_milliseconds().abs();
            if gap <= DEDUP_WINDOW_MS {
                continue;
            }
        }
        last_kept_at.insert(fingerprint, entry.timestamp);
        kept.push(entry);
    }

    kept
}

fn fingerprint(entry: &MessageEntry) -> String {
    format!(
        "{:?}|{:?}|{}|{}|{}|{}|{}|{:?}",
        entry.role,
        entry.kind,
        entry.text.as_deref().unwrap_or(""),
        entry.tool_name.as_deref().unwrap_or(""),
        entry.tool_call_id.as_deref().unwrap_or(""),
        entry
            .tool_input
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default(),
        entry.tool_output.as_deref().unwrap_or(""),
        entry.tool_is_error,
    )
}

/// Slice the feed backward from an exclusive upper-bound index.
///
/// `before` defaults to the total count, `limit` to 30 (clamped to 1..=200).
/// The returned cursor points at the slice start whenever entries precede
/// it.
pub fn paginate(
    entries: &[MessageEntry],
    before: Option<usize>,
    limit: Option<usize>,
) -> MessagePage {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let end = before.unwrap_or(entries.len()).min(entries.len());
    let start = end.saturating_sub(limit);

    MessagePage {
        entries: entries[start..end].to_vec(),
        next_cursor: (start > 0).then_some(start),
        has_more: start > 0,
    }
}
