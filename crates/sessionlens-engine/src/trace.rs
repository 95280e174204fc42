use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sessionlens_types::{EventPayload, SessionEvent};
use std::collections::{HashMap, HashSet};

// NOTE: The trace is a heuristic partition, not a profiler. Transcript
// timestamps are sparse and imprecisely ordered; the classification below
// approximates where session time went (tool execution, waiting on the
// human, model latency) and must not be read as measured ground truth.

/// What a slice of session time was spent on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// Inside a tool call/result interval
    Tool,
    /// Agent finished a turn, waiting on the human
    Waiting,
    /// Unattributed latency (post-tool deliberation, pre-response thinking)
    Think,
    /// Trailing edge is an assistant message: text was being generated
    Gen,
}

/// One labeled segment of the session partition. Spans tile
/// `[first_event, last_event]` with no gaps and no overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSpan {
    pub kind: SpanKind,
    pub duration_ms: u64,
    pub token_count: u64,
    pub event_count: u32,
}

type Instant = DateTime<Utc>;
type Interval = (Instant, Instant);

struct SpanBuild {
    kind: SpanKind,
    start: Instant,
    end: Instant,
    token_count: u64,
    event_count: u32,
}

/// Partition the session window into contiguous labeled spans.
///
/// Zero-duration sessions (one event, or identical timestamps throughout)
/// produce an empty partition. A session with no tool intervals and no turn
/// alternation becomes one default `think` span.
pub fn reconstruct_trace(events: &[SessionEvent]) -> Vec<TraceSpan> {
    let Some(start) = events.iter().map(|e| e.timestamp).min() else {
        return Vec::new();
    };
    let Some(end) = events.iter().map(|e| e.timestamp).max() else {
        return Vec::new();
    };
    if end <= start {
        return Vec::new();
    }

    let mut user_ts: Vec<Instant> = events
        .iter()
        .filter(|e| matches!(e.payload, EventPayload::User { .. }))
        .map(|e| e.timestamp)
        .collect();
    user_ts.sort_unstable();
    user_ts.dedup();

    let mut assistant_ts: Vec<Instant> = events
        .iter()
        .filter(|e| matches!(e.payload, EventPayload::Assistant { .. }))
        .map(|e| e.timestamp)
        .collect();
    assistant_ts.sort_unstable();
    assistant_ts.dedup();

    let tool_intervals = merged_tool_intervals(events, start, end);
    let waiting_intervals = waiting_intervals(&user_ts, &assistant_ts, end);

    // Cut points: window edges, interval endpoints, and every message
    // timestamp. Consecutive cuts bound the smallest classifiable segments.
    let mut cuts: Vec<Instant> = vec![start, end];
    for (a, b) in tool_intervals.iter().chain(waiting_intervals.iter()) {
        cuts.push(*a);
        cuts.push(*b);
    }
    cuts.extend(user_ts.iter().copied());
    cuts.extend(assistant_ts.iter().copied());
    cuts.retain(|t| *t >= start && *t <= end);
    cuts.sort_unstable();
    cuts.dedup();

    let user_set: HashSet<Instant> = user_ts.iter().copied().collect();
    let assistant_set: HashSet<Instant> = assistant_ts.iter().copied().collect();

    let mut spans: Vec<SpanBuild> = Vec::new();
    for window in cuts.windows(2) {
        let (seg_start, seg_end) = (window[0], window[1]);
        let kind = classify_segment(
            seg_start,
            seg_end,
            &tool_intervals,
            &waiting_intervals,
            &user_set,
            &assistant_set,
        );
        match spans.last_mut() {
            Some(last) if last.kind == kind => last.end = seg_end,
            _ => spans.push(SpanBuild {
                kind,
                start: seg_start,
                end: seg_end,
                token_count: 0,
                event_count: 0,
            }),
        }
    }

    attribute_usage(&mut spans, events, start, end);

    spans
        .into_iter()
        .map(|span| TraceSpan {
            kind: span.kind,
            duration_ms: (span.end - span.start).num_milliseconds().max(0) as u64,
            token_count: span.token_count,
            event_count: span.event_count,
        })
        .collect()
}

/// Classify one segment between consecutive cut points.
///
/// Precedence: tool > waiting > gen > think. The think default absorbs
/// ambiguous latency (e.g. deliberation after a tool result lands). Kept as
/// a standalone function so consumers that need a different boundary rule
/// can re-partition without touching the sweep.
pub fn classify_segment(
    start: Instant,
    end: Instant,
    tool_intervals: &[Interval],
    waiting_intervals: &[Interval],
    user_ts: &HashSet<Instant>,
    assistant_ts: &HashSet<Instant>,
) -> SpanKind {
    if overlaps_any(tool_intervals, start, end) {
        SpanKind::Tool
    } else if overlaps_any(waiting_intervals, start, end) || user_ts.contains(&end) {
        SpanKind::Waiting
    } else if assistant_ts.contains(&end) {
        SpanKind::Gen
    } else {
        SpanKind::Think
    }
}

fn overlaps_any(intervals: &[Interval], start: Instant, end: Instant) -> bool {
    intervals.iter().any(|(a, b)| *a < end && *b > start)
}

/// Pair tool calls with their results by call id, clip to the window, and
/// merge overlapping/touching intervals into a minimal disjoint set.
fn merged_tool_intervals(events: &[SessionEvent], start: Instant, end: Instant) -> Vec<Interval> {
    let mut open_calls: HashMap<&str, Instant> = HashMap::new();
    let mut intervals: Vec<Interval> = Vec::new();

    for event in events {
        match &event.payload {
            EventPayload::ToolCall(call) => {
                if let Some(id) = &call.call_id {
                    open_calls.entry(id.as_str()).or_insert(event.timestamp);
                }
            }
            EventPayload::ToolResult(result) => {
                if let Some(call_ts) = open_calls.remove(result.call_id.as_str()) {
                    // Log skew can put the result before the call
                    let lo = call_ts.min(event.timestamp);
                    let hi = call_ts.max(event.timestamp);
                    intervals.push((lo, hi));
                }
            }
            _ => {}
        }
    }

    let mut clipped: Vec<Interval> = intervals
        .into_iter()
        .filter_map(|(lo, hi)| {
            let lo = lo.max(start);
            let hi = hi.min(end);
            (lo <= hi).then_some((lo, hi))
        })
        .collect();
    clipped.sort_unstable();

    let mut merged: Vec<Interval> = Vec::new();
    for (lo, hi) in clipped {
        match merged.last_mut() {
            Some((_, last_hi)) if lo <= *last_hi => *last_hi = (*last_hi).max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

/// Sweep user and assistant message timestamps together: an assistant
/// timestamp opens a waiting interval (if none is open) and the next user
/// timestamp closes it; an interval still open at the end of the sweep
/// closes at the session end.
fn waiting_intervals(user_ts: &[Instant], assistant_ts: &[Instant], end: Instant) -> Vec<Interval> {
    let mut intervals = Vec::new();
    let mut open: Option<Instant> = None;

    let mut ui = 0;
    let mut ai = 0;
    while ui < user_ts.len() || ai < assistant_ts.len() {
        let take_assistant = match (user_ts.get(ui), assistant_ts.get(ai)) {
            (Some(u), Some(a)) => a <= u,
            (None, Some(_)) => true,
            _ => false,
        };

        if take_assistant {
            if open.is_none() {
                open = Some(assistant_ts[ai]);
            }
            ai += 1;
        } else {
            if let Some(opened) = open.take() {
                intervals.push((opened, user_ts[ui]));
            }
            ui += 1;
        }
    }

    if let Some(opened) = open {
        intervals.push((opened, end));
    }

    intervals
}

/// Attribute usage deltas to spans with a single forward pointer.
///
/// Token events are frequently logged slightly after a boundary due to log
/// skew, so exact-containment-only attribution loses data: a delta landing
/// in a tool or waiting span is credited to the most recently visited
/// think/gen span instead (or the next one, if none precedes it).
fn attribute_usage(spans: &mut [SpanBuild], events: &[SessionEvent], start: Instant, end: Instant) {
    if spans.is_empty() {
        return;
    }

    let mut deltas: Vec<(Instant, u64)> = events
        .iter()
        .filter_map(|event| match &event.payload {
            EventPayload::TokenUsage(usage)
                if event.timestamp >= start && event.timestamp <= end =>
            {
                Some((event.timestamp, usage.usage.total_tokens()))
            }
            _ => None,
        })
        .collect();
    deltas.sort_unstable_by_key(|(ts, _)| *ts);

    let is_credit_target =
        |kind: SpanKind| matches!(kind, SpanKind::Think | SpanKind::Gen);

    let mut current = 0;
    let mut last_visited: Option<usize> = is_credit_target(spans[0].kind).then_some(0);

    for (ts, tokens) in deltas {
        while current + 1 < spans.len() && spans[current].end < ts {
            current += 1;
            if is_credit_target(spans[current].kind) {
                last_visited = Some(current);
            }
        }

        let target = if is_credit_target(spans[current].kind) {
            current
        } else if let Some(visited) = last_visited {
            visited
        } else if let Some(upcoming) =
            (current + 1..spans.len()).find(|&i| is_credit_target(spans[i].kind))
        {
            upcoming
        } else {
            current
        };

        spans[target].token_count += tokens;
        spans[target].event_count += 1;
    }
}
