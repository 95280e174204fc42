use sessionlens_types::{SessionMeta, truncate};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::Result;
use crate::jsonl::parse_timestamp;

use super::schema::{CodexRecord, EventMsgPayload, MessageContent, ResponseItemPayload};

/// Lines inspected before giving up on identity extraction
const HEADER_SCAN_LINES: usize = 25;

/// Cheaply extract session identity from a codex rollout file.
///
/// Reads only the first few lines; never fails on malformed content (a file
/// without a recognizable `session_meta` yields `None`).
pub(crate) fn read_codex_header(path: &Path) -> Result<Option<SessionMeta>> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut meta: Option<SessionMeta> = None;
    let mut snippet: Option<String> = None;
    let mut fallback_cwd: Option<PathBuf> = None;

    for line in reader.lines().take(HEADER_SCAN_LINES) {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let Ok(record) = serde_json::from_str::<CodexRecord>(line.trim_start_matches('\u{feff}'))
        else {
            continue;
        };

        match record {
            CodexRecord::SessionMeta(record) => {
                if meta.is_none() {
                    let mut m = SessionMeta::new(record.payload.id, path.to_path_buf());
                    m.working_directory = Some(PathBuf::from(record.payload.cwd));
                    m.created_at = record
                        .payload
                        .timestamp
                        .as_deref()
                        .and_then(parse_timestamp)
                        .or_else(|| parse_timestamp(&record.timestamp));
                    meta = Some(m);
                }
            }
            CodexRecord::TurnContext(record) => {
                if fallback_cwd.is_none() {
                    fallback_cwd = Some(PathBuf::from(record.payload.cwd));
                }
            }
            CodexRecord::EventMsg(record) => {
                if snippet.is_none()
                    && let EventMsgPayload::UserMessage(msg) = &record.payload
                    && !msg.message.contains("<environment_context>")
                {
                    snippet = Some(truncate(&msg.message, 200));
                }
            }
            CodexRecord::ResponseItem(record) => {
                if snippet.is_none()
                    && let ResponseItemPayload::Message(msg) = &record.payload
                    && msg.role == "user"
                {
                    let text = msg.content.iter().find_map(|c| match c {
                        MessageContent::InputText { text } => Some(text),
                        _ => None,
                    });
                    if let Some(text) = text
                        && !text.contains("<environment_context>")
                    {
                        snippet = Some(truncate(text, 200));
                    }
                }
            }
            CodexRecord::Unknown => {}
        }

        if let Some(m) = &meta
            && m.working_directory.is_some()
            && snippet.is_some()
        {
            break;
        }
    }

    Ok(meta.map(|mut m| {
        if m.working_directory.is_none() {
            m.working_directory = fallback_cwd;
        }
        m.snippet = snippet;
        m
    }))
}
