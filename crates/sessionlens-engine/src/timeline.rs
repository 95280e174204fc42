use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sessionlens_types::{EventKind, SessionEvent};

/// Nominal bucket width. The actual width stretches so the count stays
/// within [MIN_BUCKETS, MAX_BUCKETS].
const BUCKET_SECONDS: u64 = 15;
const MIN_BUCKETS: usize = 12;
const MAX_BUCKETS: usize = 96;

/// Per-kind event counts for one time slice (or a whole session)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub messages: u32,
    pub tool_calls: u32,
    pub tool_results: u32,
    pub reasoning: u32,
    pub token_usage: u32,
    pub other: u32,
}

impl KindCounts {
    pub fn record(&mut self, kind: EventKind) {
        match kind {
            EventKind::Message => self.messages += 1,
            EventKind::ToolCall => self.tool_calls += 1,
            EventKind::ToolResult => self.tool_results += 1,
            EventKind::Reasoning => self.reasoning += 1,
            EventKind::TokenUsage => self.token_usage += 1,
            EventKind::Other => self.other += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.messages
            + self.tool_calls
            + self.tool_results
            + self.reasoning
            + self.token_usage
            + self.other
    }
}

/// Count events per kind across a whole stream
pub fn count_events(events: &[SessionEvent]) -> KindCounts {
    let mut counts = KindCounts::default();
    for event in events {
        counts.record(event.kind());
    }
    counts
}

/// Number of buckets for a window: one 15s slice per bucket, clamped to
/// [12, 96]; a degenerate window collapses to a single bucket.
pub fn bucket_count(start: DateTime<Utc>, end: DateTime<Utc>) -> usize {
    let window_ms = (end - start).num_milliseconds();
    if window_ms <= 0 {
        return 1;
    }
    let raw = (window_ms as u64).div_ceil(BUCKET_SECONDS * 1000) as usize;
    raw.clamp(MIN_BUCKETS, MAX_BUCKETS)
}

/// Build the fixed-resolution activity histogram for `[start, end]`.
///
/// Every event lands in exactly one bucket, so per-kind sums across the
/// histogram equal the stream's per-kind totals.
pub fn build_timeline(
    events: &[SessionEvent],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<KindCounts> {
    let n = bucket_count(start, end);
    let mut buckets = vec![KindCounts::default(); n];
    let window_ms = (end - start).num_milliseconds();

    for event in events {
        let index = if window_ms <= 0 {
            0
        } else {
            let offset_ms = (event.timestamp - start).num_milliseconds();
            let raw = (offset_ms as i128 * n as i128) / window_ms as i128;
            raw.clamp(0, n as i128 - 1) as usize
        };
        buckets[index].record(event.kind());
    }

    buckets
}
