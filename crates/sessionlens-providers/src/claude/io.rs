use sessionlens_types::{SessionMeta, truncate};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::Result;
use crate::jsonl::parse_timestamp;

use super::schema::{ClaudeRecord, UserContent};

/// Claude files open with summary/meta records before the first real
/// message, so the identity scan needs a deeper line budget than codex.
const HEADER_SCAN_LINES: usize = 200;

/// Cheaply extract session identity from a claude transcript file.
pub(crate) fn read_claude_header(path: &Path) -> Result<Option<SessionMeta>> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut session_id: Option<String> = None;
    let mut cwd: Option<PathBuf> = None;
    let mut created_at = None;
    let mut snippet: Option<String> = None;

    for line in reader.lines().take(HEADER_SCAN_LINES) {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let Ok(record) = serde_json::from_str::<ClaudeRecord>(line.trim_start_matches('\u{feff}'))
        else {
            continue;
        };

        match &record {
            ClaudeRecord::User(user) => {
                if session_id.is_none() {
                    session_id = Some(user.session_id.clone());
                }
                if cwd.is_none() {
                    cwd = user.cwd.clone().map(PathBuf::from);
                }
                if created_at.is_none() {
                    created_at = parse_timestamp(&user.timestamp);
                }
                if snippet.is_none() && !user.is_meta && !user.is_sidechain {
                    snippet = user.message.content.iter().find_map(|c| match c {
                        // XML-wrapped texts are command envelopes, not prompts
                        UserContent::Text { text } if !text.starts_with('<') => {
                            Some(truncate(text, 200))
                        }
                        _ => None,
                    });
                }
            }
            ClaudeRecord::Assistant(assistant) => {
                if session_id.is_none() {
                    session_id = Some(assistant.session_id.clone());
                }
                if cwd.is_none() {
                    cwd = assistant.cwd.clone().map(PathBuf::from);
                }
                if created_at.is_none() {
                    created_at = parse_timestamp(&assistant.timestamp);
                }
            }
            ClaudeRecord::Unknown => {}
        }

        if session_id.is_some() && cwd.is_some() && created_at.is_some() && snippet.is_some() {
            break;
        }
    }

    Ok(session_id.map(|id| {
        let mut meta = SessionMeta::new(id, path.to_path_buf());
        meta.working_directory = cwd;
        meta.created_at = created_at;
        meta.snippet = snippet;
        meta
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_skips_meta_and_summary_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"type":"summary","summary":"Earlier work","leafUuid":"x"}"#,
                "\n",
                r#"{"type":"user","uuid":"u0","sessionId":"sess-9","timestamp":"2025-03-01T10:00:00Z","cwd":"/home/user/proj","isMeta":true,"message":{"role":"user","content":"Caveat: preamble"}}"#,
                "\n",
                r#"{"type":"user","uuid":"u1","sessionId":"sess-9","timestamp":"2025-03-01T10:00:02Z","cwd":"/home/user/proj","message":{"role":"user","content":"add a retry flag"}}"#,
                "\n",
            ),
        )
        .unwrap();

        let meta = read_claude_header(&path).unwrap().unwrap();
        assert_eq!(meta.id, "sess-9");
        assert_eq!(
            meta.working_directory,
            Some(PathBuf::from("/home/user/proj"))
        );
        assert_eq!(meta.snippet.as_deref(), Some("add a retry flag"));
    }

    #[test]
    fn test_file_without_identity_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jsonl");
        std::fs::write(&path, "{\"type\":\"summary\",\"summary\":\"x\"}\n").unwrap();
        assert!(read_claude_header(&path).unwrap().is_none());
    }
}
