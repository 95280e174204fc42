use chrono::{DateTime, Utc};
use regex::Regex;
use sessionlens_types::{
    EventPayload, SessionEvent, TokenUsagePayload, TokenUsageSnapshot, ToolCallPayload,
    ToolResultPayload,
};
use std::sync::LazyLock;

use crate::correlate::{Pending, PendingTable};
use crate::jsonl::{RecordMapper, parse_timestamp};
use crate::{Error, Result};

use super::schema::{self, CodexRecord, RawTokenUsage};

/// Regex for extracting exit codes from codex tool output
/// Example: "Exit code: 0" or "Exit Code: 0" (case-insensitive)
static EXIT_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Exit Code:\s*(\d+)").unwrap());

/// A tool result seen before its call, buffered until the call (or end of
/// file) arrives.
struct BufferedResult {
    timestamp: DateTime<Utc>,
    call_id: String,
    output: String,
    is_error: bool,
}

/// Stateful line-to-events mapping for codex rollout files.
///
/// Holds the per-file cumulative usage baseline: `token_count` records carry
/// "total usage so far", so each record's contribution is the clamped
/// per-field difference against the previous snapshot in the same file.
pub(crate) struct CodexMapper {
    last_cumulative: TokenUsageSnapshot,
    pending: PendingTable<String, BufferedResult>,
}

impl CodexMapper {
    pub(crate) fn new() -> Self {
        Self {
            last_cumulative: TokenUsageSnapshot::default(),
            pending: PendingTable::new(),
        }
    }

    fn map_tool_call(
        &mut self,
        timestamp: DateTime<Utc>,
        name: String,
        raw_arguments: &str,
        call_id: String,
    ) -> Vec<SessionEvent> {
        let mut events = vec![SessionEvent::new(
            timestamp,
            EventPayload::ToolCall(ToolCallPayload {
                name: name.clone(),
                arguments: parse_json_arguments(raw_arguments),
                call_id: Some(call_id.clone()),
            }),
        )];

        if let Some(buffered) = self.pending.register_call(&call_id, name.clone()) {
            events.push(SessionEvent::new(
                buffered.timestamp,
                EventPayload::ToolResult(ToolResultPayload {
                    call_id: buffered.call_id,
                    output: buffered.output,
                    is_error: buffered.is_error,
                    tool_name: Some(name),
                }),
            ));
        }

        events
    }

    fn map_tool_result(
        &mut self,
        timestamp: DateTime<Utc>,
        output: schema::FunctionCallOutputPayload,
    ) -> Vec<SessionEvent> {
        let is_error = extract_exit_code(&output.output)
            .map(|code| code != 0)
            .unwrap_or(false);

        match self.pending.register_result(
            &output.call_id,
            BufferedResult {
                timestamp,
                call_id: output.call_id.clone(),
                output: output.output.clone(),
                is_error,
            },
        ) {
            Some(tool_name) => vec![SessionEvent::new(
                timestamp,
                EventPayload::ToolResult(ToolResultPayload {
                    call_id: output.call_id,
                    output: output.output,
                    is_error,
                    tool_name: Some(tool_name),
                }),
            )],
            // Result before call: buffered until the call shows up
            None => vec![],
        }
    }

    fn map_token_count(
        &mut self,
        timestamp: DateTime<Utc>,
        raw: &RawTokenUsage,
    ) -> Vec<SessionEvent> {
        let cumulative = TokenUsageSnapshot::new(
            raw.input_tokens.saturating_sub(raw.cached_input_tokens),
            raw.cached_input_tokens,
            raw.output_tokens.saturating_sub(raw.reasoning_output_tokens),
            raw.reasoning_output_tokens,
        );

        let delta = cumulative.saturating_delta(&self.last_cumulative);
        self.last_cumulative = cumulative;

        // Codex re-emits identical token_count records; a zero delta carries
        // no information.
        if delta.is_zero() {
            return vec![];
        }

        vec![SessionEvent::new(
            timestamp,
            EventPayload::TokenUsage(TokenUsagePayload {
                usage: delta,
                message_id: None,
            }),
        )]
    }
}

impl RecordMapper for CodexMapper {
    fn map_line(&mut self, line: &str) -> Result<Vec<SessionEvent>> {
        let record: CodexRecord = serde_json::from_str(line)?;

        match record {
            // Identity records; surfaced through header extraction instead
            CodexRecord::SessionMeta(_) | CodexRecord::TurnContext(_) => Ok(vec![]),

            CodexRecord::EventMsg(event_msg) => {
                let timestamp = record_timestamp(&event_msg.timestamp)?;
                match event_msg.payload {
                    schema::EventMsgPayload::TokenCount(token_count) => Ok(token_count
                        .info
                        .map(|info| self.map_token_count(timestamp, &info.total_token_usage))
                        .unwrap_or_default()),

                    // Message/reasoning event_msg records duplicate their
                    // response_item counterparts; only the latter are mapped.
                    schema::EventMsgPayload::UserMessage(_)
                    | schema::EventMsgPayload::AgentMessage(_)
                    | schema::EventMsgPayload::AgentReasoning(_)
                    | schema::EventMsgPayload::Unknown => Ok(vec![]),
                }
            }

            CodexRecord::ResponseItem(item) => {
                let timestamp = record_timestamp(&item.timestamp)?;
                match item.payload {
                    schema::ResponseItemPayload::Message(message) => {
                        let text = extract_message_text(&message.content);
                        let payload = if message.role == "user" {
                            EventPayload::User { text }
                        } else {
                            EventPayload::Assistant { text }
                        };
                        Ok(vec![SessionEvent::new(timestamp, payload)])
                    }

                    schema::ResponseItemPayload::Reasoning(reasoning) => {
                        let text = extract_reasoning_text(&reasoning);
                        Ok(vec![SessionEvent::new(
                            timestamp,
                            EventPayload::Reasoning { text },
                        )])
                    }

                    schema::ResponseItemPayload::FunctionCall(call) => Ok(self.map_tool_call(
                        timestamp,
                        call.name,
                        &call.arguments,
                        call.call_id,
                    )),

                    schema::ResponseItemPayload::CustomToolCall(call) => {
                        Ok(self.map_tool_call(timestamp, call.name, &call.input, call.call_id))
                    }

                    schema::ResponseItemPayload::FunctionCallOutput(output)
                    | schema::ResponseItemPayload::CustomToolCallOutput(output) => {
                        Ok(self.map_tool_result(timestamp, output))
                    }

                    schema::ResponseItemPayload::Unknown => Ok(vec![]),
                }
            }

            CodexRecord::Unknown => {
                // Recognized as a record, unrecognized as a type: keep it in
                // the stream for event counting if it carries a timestamp.
                let value: serde_json::Value = serde_json::from_str(line)?;
                match extract_value_timestamp(&value) {
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
                // A call without a result already produced its event
                Pending::AwaitingResult(_) => None,
            })
            .collect()
    }
}

fn record_timestamp(ts: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(ts).ok_or_else(|| Error::Parse(format!("invalid timestamp: {}", ts)))
}

/// Timestamp lives at the top level or inside `payload`, depending on the
/// record generation.
fn extract_value_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    value
        .get("timestamp")
        .or_else(|| value.get("payload").and_then(|p| p.get("timestamp")))
        .and_then(|ts| ts.as_str())
        .and_then(parse_timestamp)
}

/// Extract text from message content blocks
fn extract_message_text(content: &[schema::MessageContent]) -> String {
    content
        .iter()
        .filter_map(|c| match c {
            schema::MessageContent::InputText { text } => Some(text.as_str()),
            schema::MessageContent::OutputText { text } => Some(text.as_str()),
            schema::MessageContent::Unknown => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract text from reasoning summary blocks, preferring full content
fn extract_reasoning_text(reasoning: &schema::ReasoningPayload) -> String {
    if let Some(content) = &reasoning.content {
        return content.clone();
    }

    reasoning
        .summary
        .iter()
        .filter_map(|s| match s {
            schema::SummaryText::SummaryText { text } => Some(text.as_str()),
            schema::SummaryText::Unknown => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse JSON string arguments to serde_json::Value.
/// If parsing fails, wrap the string in a JSON object.
fn parse_json_arguments(args: &str) -> serde_json::Value {
    serde_json::from_str(args).unwrap_or_else(|_| serde_json::json!({ "raw": args }))
}

fn extract_exit_code(output: &str) -> Option<i32> {
    EXIT_CODE_REGEX
        .captures(output)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
