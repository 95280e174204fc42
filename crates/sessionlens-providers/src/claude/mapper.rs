use chrono::{DateTime, Utc};
use sessionlens_types::{
    EventPayload, SessionEvent, TokenUsagePayload, TokenUsageSnapshot, ToolCallPayload,
    ToolResultPayload,
};

use crate::correlate::{Pending, PendingTable};
use crate::jsonl::{RecordMapper, parse_timestamp};
use crate::{Error, Result};

use super::schema::{AssistantContent, ClaudeRecord, RawUsage, UserContent};

/// A tool result whose call has not been seen yet. Claude's streaming UI can
/// flush the result record before the call record, so either order must
/// round-trip through the pending table.
struct BufferedResult {
    timestamp: DateTime<Utc>,
    call_id: String,
    output: String,
    is_error: bool,
}

/// Stateful line-to-events mapping for claude transcript files.
pub(crate) struct ClaudeMapper {
    pending: PendingTable<String, BufferedResult>,
}

impl ClaudeMapper {
    pub(crate) fn new() -> Self {
        Self {
            pending: PendingTable::new(),
        }
    }

    fn map_tool_result(
        &mut self,
        timestamp: DateTime<Utc>,
        tool_use_id: &str,
        content: Option<&serde_json::Value>,
        is_error: bool,
    ) -> Vec<SessionEvent> {
        let output = extract_result_text(content);
        match self.pending.register_result(
            tool_use_id,
            BufferedResult {
                timestamp,
                call_id: tool_use_id.to_string(),
                output: output.clone(),
                is_error,
            },
        ) {
            Some(tool_name) => vec![SessionEvent::new(
                timestamp,
                EventPayload::ToolResult(ToolResultPayload {
                    call_id: tool_use_id.to_string(),
                    output,
                    is_error,
                    tool_name: Some(tool_name),
                }),
            )],
            None => vec![],
        }
    }

    fn map_tool_use(
        &mut self,
        timestamp: DateTime<Utc>,
        id: &str,
        name: &str,
        input: serde_json::Value,
    ) -> Vec<SessionEvent> {
        let mut events = vec![SessionEvent::new(
            timestamp,
            EventPayload::ToolCall(ToolCallPayload {
                name: name.to_string(),
                arguments: input,
                call_id: Some(id.to_string()),
            }),
        )];

        if let Some(buffered) = self.pending.register_call(id, name.to_string()) {
            events.push(SessionEvent::new(
                buffered.timestamp,
                EventPayload::ToolResult(ToolResultPayload {
                    call_id: buffered.call_id,
                    output: buffered.output,
                    is_error: buffered.is_error,
                    tool_name: Some(name.to_string()),
                }),
            ));
        }

        events
    }
}

impl RecordMapper for ClaudeMapper {
    fn map_line(&mut self, line: &str) -> Result<Vec<SessionEvent>> {
        let record: ClaudeRecord = serde_json::from_str(line)?;

        match record {
            ClaudeRecord::User(user) => {
                // Meta preambles are tool-injected, not human turns
                if user.is_meta {
                    return Ok(vec![]);
                }
                let timestamp = record_timestamp(&user.timestamp)?;

                let mut events = Vec::new();
                for content in &user.message.content {
                    match content {
                        UserContent::Text { text } => {
                            events.push(SessionEvent::new(
                                timestamp,
                                EventPayload::User { text: text.clone() },
                            ));
                        }
                        UserContent::ToolResult {
                            tool_use_id,
                            content,
                            is_error,
                        } => {
                            events.extend(self.map_tool_result(
                                timestamp,
                                tool_use_id,
                                content.as_ref(),
                                *is_error,
                            ));
                        }
                        UserContent::Unknown => {}
                    }
                }
                Ok(events)
            }

            ClaudeRecord::Assistant(assistant) => {
                let timestamp = record_timestamp(&assistant.timestamp)?;

                let mut events = Vec::new();
                for content in &assistant.message.content {
                    match content {
                        AssistantContent::Text { text } => {
                            events.push(SessionEvent::new(
                                timestamp,
                                EventPayload::Assistant { text: text.clone() },
                            ));
                        }
                        AssistantContent::Thinking { thinking } => {
                            events.push(SessionEvent::new(
                                timestamp,
                                EventPayload::Reasoning {
                                    text: thinking.clone(),
                                },
                            ));
                        }
                        AssistantContent::ToolUse { id, name, input } => {
                            events.extend(self.map_tool_use(timestamp, id, name, input.clone()));
                        }
                        AssistantContent::ToolResult {
                            tool_use_id,
                            content,
                            is_error,
                        } => {
                            events.extend(self.map_tool_result(
                                timestamp,
                                tool_use_id,
                                content.as_ref(),
                                *is_error,
                            ));
                        }
                        AssistantContent::Unknown => {}
                    }
                }

                if let Some(usage) = &assistant.message.usage {
                    events.push(SessionEvent::new(
                        timestamp,
                        EventPayload::TokenUsage(TokenUsagePayload {
                            usage: convert_usage(usage),
                            message_id: Some(assistant.message.id.clone()),
                        }),
                    ));
                }

                Ok(events)
            }

            ClaudeRecord::Unknown => {
                let value: serde_json::Value = serde_json::from_str(line)?;
                match value
                    .get("timestamp")
                    .and_then(|ts| ts.as_str())
                    .and_then(parse_timestamp)
                {
                    Some(timestamp) => {
                        Ok(vec![SessionEvent::new(timestamp, EventPayload::Other)])
                    }
                    None => Err(Error::Parse("record without usable timestamp".to_string())),
                }
            }
        }
    }

    fn finish(&mut self) -> Vec<SessionEvent> {
        self.pending
            .drain()
            .into_iter()
            .filter_map(|(_, slot)| match slot {
                Pending::AwaitingCall(buffered) => Some(SessionEvent::new(
                    buffered.timestamp,
                    EventPayload::ToolResult(ToolResultPayload {
                        call_id: buffered.call_id,
                        output: buffered.output,
                        is_error: buffered.is_error,
                        tool_name: None,
                    }),
                )),
                Pending::AwaitingResult(_) => None,
            })
            .collect()
    }
}

fn record_timestamp(ts: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(ts).ok_or_else(|| Error::Parse(format!("invalid timestamp: {}", ts)))
}

/// Input tokens map to fresh input, cache reads to cached input. Claude does
/// not report reasoning tokens separately.
fn convert_usage(usage: &RawUsage) -> TokenUsageSnapshot {
    TokenUsageSnapshot::new(
        usage.input_tokens,
        usage.cache_read_input_tokens.unwrap_or(0)
            + usage.cache_creation_input_tokens.unwrap_or(0),
        usage.output_tokens,
        0,
    )
}

/// Tool result content is a bare string, an array of text parts, or absent
fn extract_result_text(content: Option<&serde_json::Value>) -> String {
    match content {
        None => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sessionlens_types::EventKind;

    fn map_all(lines: &[&str]) -> Vec<SessionEvent> {
        let mut mapper = ClaudeMapper::new();
        let mut events = Vec::new();
        for line in lines {
            if let Ok(mut batch) = mapper.map_line(line) {
                events.append(&mut batch);
            }
        }
        events.extend(mapper.finish());
        events
    }

    const ASSISTANT_WITH_TOOL: &str = r#"{"type":"assistant","uuid":"u2","sessionId":"s1","timestamp":"2025-03-01T10:00:01Z","cwd":"/home/user/proj","message":{"id":"msg_1","role":"assistant","model":"claude-sonnet-4","content":[{"type":"tool_use","id":"toolu_1","name":"Bash","input":{"command":"ls"}}],"usage":{"input_tokens":100,"output_tokens":30,"cache_read_input_tokens":40}}}"#;

    const USER_WITH_RESULT: &str = r#"{"type":"user","uuid":"u3","sessionId":"s1","timestamp":"2025-03-01T10:00:05Z","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"toolu_1","content":"src\nREADME.md"}]}}"#;

    #[test]
    fn test_string_content_becomes_user_event() {
        let events = map_all(&[
            r#"{"type":"user","uuid":"u1","sessionId":"s1","timestamp":"2025-03-01T10:00:00Z","cwd":"/home/user/proj","message":{"role":"user","content":"hello there"}}"#,
        ]);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0].payload, EventPayload::User { text } if text == "hello there"));
    }

    #[test]
    fn test_assistant_blocks_and_per_message_usage() {
        let events = map_all(&[
            r#"{"type":"assistant","uuid":"u2","sessionId":"s1","timestamp":"2025-03-01T10:00:01Z","message":{"id":"msg_1","role":"assistant","content":[{"type":"thinking","thinking":"let me see"},{"type":"text","text":"done"}],"usage":{"input_tokens":10,"output_tokens":5}}}"#,
        ]);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind(), EventKind::Reasoning);
        assert_eq!(events[1].kind(), EventKind::Message);
        match &events[2].payload {
            EventPayload::TokenUsage(usage) => {
                assert_eq!(usage.message_id.as_deref(), Some("msg_1"));
                assert_eq!(usage.usage.input_tokens, 10);
            }
            other => panic!("Expected TokenUsage, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_pairing_call_first() {
        let events = map_all(&[ASSISTANT_WITH_TOOL, USER_WITH_RESULT]);

        let result = events
            .iter()
            .find_map(|e| match &e.payload {
                EventPayload::ToolResult(r) => Some(r),
                _ => None,
            })
            .expect("tool result event");
        assert_eq!(result.tool_name.as_deref(), Some("Bash"));
        assert_eq!(result.output, "src\nREADME.md");
    }

    #[test]
    fn test_tool_pairing_result_first() {
        // Streaming can flush the result record ahead of the call record
        let events = map_all(&[USER_WITH_RESULT, ASSISTANT_WITH_TOOL]);

        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
        assert!(kinds.contains(&EventKind::ToolCall));
        assert!(kinds.contains(&EventKind::ToolResult));

        let result = events
            .iter()
            .find_map(|e| match &e.payload {
                EventPayload::ToolResult(r) => Some(r),
                _ => None,
            })
            .unwrap();
        // Name backfilled from the call even though the result came first
        assert_eq!(result.tool_name.as_deref(), Some("Bash"));
        // The buffered result keeps its own timestamp
        assert_eq!(
            result.output,
            "src\nREADME.md"
        );
    }

    #[test]
    fn test_meta_records_are_silent() {
        let events = map_all(&[
            r#"{"type":"user","uuid":"u1","sessionId":"s1","timestamp":"2025-03-01T10:00:00Z","isMeta":true,"message":{"role":"user","content":"Caveat: injected preamble"}}"#,
        ]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_error_result_flag_preserved() {
        let events = map_all(&[
            ASSISTANT_WITH_TOOL,
            r#"{"type":"user","uuid":"u3","sessionId":"s1","timestamp":"2025-03-01T10:00:05Z","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"toolu_1","content":"command not found","is_error":true}]}}"#,
        ]);
        let result = events
            .iter()
            .find_map(|e| match &e.payload {
                EventPayload::ToolResult(r) => Some(r),
                _ => None,
            })
            .unwrap();
        assert!(result.is_error);
    }

    #[test]
    fn test_array_result_content_joined() {
        assert_eq!(
            extract_result_text(Some(&serde_json::json!([
                {"type":"text","text":"line one"},
                {"type":"text","text":"line two"}
            ]))),
            "line one\nline two"
        );
        assert_eq!(extract_result_text(None), "");
    }
}
