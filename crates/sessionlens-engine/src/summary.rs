use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sessionlens_types::{SessionEvent, SessionMeta, TokenUsageSnapshot};

use crate::accounting::total_usage;
use crate::timeline::{KindCounts, build_timeline, count_events};
use crate::trace::{TraceSpan, reconstruct_trace};

/// Everything the API layer needs to render one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub event_counts: KindCounts,
    pub token_usage: TokenUsageSnapshot,
    pub timeline: Vec<KindCounts>,
    pub trace: Vec<TraceSpan>,
}

/// Assemble the summary view from a session's canonical event stream
pub fn summarize_session(meta: &SessionMeta, events: &[SessionEvent]) -> SessionSummary {
    let first_event_at = events.iter().map(|e| e.timestamp).min();
    let last_event_at = events.iter().map(|e| e.timestamp).max();

    let (duration_ms, timeline) = match (first_event_at, last_event_at) {
        (Some(first), Some(last)) => (
            (last - first).num_milliseconds().max(0) as u64,
            build_timeline(events, first, last),
        ),
        _ => (0, Vec::new()),
    };

    SessionSummary {
        id: meta.id.clone(),
        created_at: meta.created_at.or(first_event_at),
        last_event_at,
        duration_ms,
        event_counts: count_events(events),
        token_usage: total_usage(events),
        timeline,
        trace: reconstruct_trace(events),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sessionlens_types::EventPayload;
    use std::path::PathBuf;

    #[test]
    fn test_empty_session_summary() {
        let meta = SessionMeta::new("s1", PathBuf::from("/logs/a.jsonl"));
        let summary = summarize_session(&meta, &[]);
        assert_eq!(summary.duration_ms, 0);
        assert!(summary.timeline.is_empty());
        assert!(summary.trace.is_empty());
        assert!(summary.token_usage.is_zero());
    }

    #[test]
    fn test_summary_window_and_counts() {
        let meta = SessionMeta::new("s1", PathBuf::from("/logs/a.jsonl"));
        let events = vec![
            SessionEvent::new(
                Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                EventPayload::User {
                    text: "hi".to_string(),
                },
            ),
            SessionEvent::new(
                Utc.timestamp_opt(1_700_000_060, 0).unwrap(),
                EventPayload::Assistant {
                    text: "hello".to_string(),
                },
            ),
        ];

        let summary = summarize_session(&meta, &events);
        assert_eq!(summary.duration_ms, 60_000);
        assert_eq!(summary.event_counts.messages, 2);
        assert_eq!(summary.timeline.len(), 12);
        assert_eq!(summary.created_at, Some(events[0].timestamp));
        assert_eq!(summary.last_event_at, Some(events[1].timestamp));
    }
}
