use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::usage::TokenUsageSnapshot;

// NOTE: Schema design goals
//
// 1. Normalization: provider-specific transcript quirks are absorbed by the
//    adapters; everything downstream (accounting, timeline, trace, feed)
//    consumes this one canonical shape and never inspects raw records.
//
// 2. Delta correctness: TokenUsage events always carry an *incremental*
//    snapshot. Cumulative counters (codex) are diffed per file at parse
//    time; per-message usage (claude) carries the originating message id so
//    the session loader can drop re-emissions across files.
//
// 3. Classification is shape-only: kind and role are pure functions of the
//    payload variant, with no hidden state.

/// One normalized transcript event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Event timestamp (UTC). Not assumed monotonic within a file.
    pub timestamp: DateTime<Utc>,

    /// Event type and content (flattened enum)
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl SessionEvent {
    pub fn new(timestamp: DateTime<Utc>, payload: EventPayload) -> Self {
        Self { timestamp, payload }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
#[serde(rename_all = "snake_case")]
pub enum EventPayload {
    /// User input text
    User { text: String },

    /// Assistant text response
    Assistant { text: String },

    /// Assistant reasoning/thinking content
    Reasoning { text: String },

    /// Tool execution request
    ToolCall(ToolCallPayload),

    /// Tool execution result
    ToolResult(ToolResultPayload),

    /// Incremental token usage (sidecar, never part of the conversation)
    TokenUsage(TokenUsagePayload),

    /// Recognized but unclassified record (kept for event counting)
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallPayload {
    /// Tool name as reported by the provider
    pub name: String,

    /// Tool arguments (already parsed to JSON)
    pub arguments: Value,

    /// Provider-assigned call ID, used to pair with the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultPayload {
    /// Provider-assigned call ID of the originating call
    pub call_id: String,

    /// Tool output (text, JSON string, error message, etc.)
    pub output: String,

    /// Execution success or failure
    #[serde(default)]
    pub is_error: bool,

    /// Name of the paired tool call, when the call was seen first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsagePayload {
    /// Incremental usage attributable to this point in the stream
    pub usage: TokenUsageSnapshot,

    /// Originating assistant message id, for providers that report usage
    /// per message. The same message can appear in more than one file of a
    /// multi-file session; first sighting wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Coarse event classification used by the timeline and summary counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Message,
    ToolCall,
    ToolResult,
    Reasoning,
    TokenUsage,
    Other,
}

/// Conversation role, defined only for message-like events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::User { .. } | EventPayload::Assistant { .. } => EventKind::Message,
            EventPayload::Reasoning { .. } => EventKind::Reasoning,
            EventPayload::ToolCall(_) => EventKind::ToolCall,
            EventPayload::ToolResult(_) => EventKind::ToolResult,
            EventPayload::TokenUsage(_) => EventKind::TokenUsage,
            EventPayload::Other => EventKind::Other,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            EventPayload::User { .. } => Some(Role::User),
            EventPayload::Assistant { .. } | EventPayload::Reasoning { .. } => {
                Some(Role::Assistant)
            }
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            EventPayload::User { text }
            | EventPayload::Assistant { text }
            | EventPayload::Reasoning { text } => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_round_trip() {
        let event = SessionEvent::new(
            Utc::now(),
            EventPayload::User {
                text: "Hello".to_string(),
            },
        );

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: SessionEvent = serde_json::from_str(&json).unwrap();

        match deserialized.payload {
            EventPayload::User { text } => assert_eq!(text, "Hello"),
            _ => panic!("Wrong payload type"),
        }
    }

    #[test]
    fn test_kind_is_pure_function_of_shape() {
        let call = EventPayload::ToolCall(ToolCallPayload {
            name: "bash".to_string(),
            arguments: serde_json::json!({"command": "ls"}),
            call_id: Some("call_1".to_string()),
        });
        assert_eq!(call.kind(), EventKind::ToolCall);
        assert_eq!(call.role(), None);

        let user = EventPayload::User {
            text: "hi".to_string(),
        };
        assert_eq!(user.kind(), EventKind::Message);
        assert_eq!(user.role(), Some(Role::User));

        let reasoning = EventPayload::Reasoning {
            text: "hmm".to_string(),
        };
        assert_eq!(reasoning.kind(), EventKind::Reasoning);
        assert_eq!(reasoning.role(), Some(Role::Assistant));
    }
}
