use chrono::{Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use sessionlens_types::{EventPayload, SessionEvent, TokenUsageSnapshot};

/// Sum usage deltas across a session's canonical event stream.
///
/// The stream is already delta-correct (cumulative counters diffed per
/// file, per-message usage deduplicated at load), so totaling is a plain
/// sum.
pub fn total_usage(events: &[SessionEvent]) -> TokenUsageSnapshot {
    let mut total = TokenUsageSnapshot::default();
    for event in events {
        if let EventPayload::TokenUsage(usage) = &event.payload {
            total.accumulate(&usage.usage);
        }
    }
    total
}

/// Usage attributed to one local calendar day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub usage: TokenUsageSnapshot,
}

/// Accumulator for per-day usage across many sessions.
///
/// Each usage event lands on the calendar day its UTC timestamp falls in
/// after conversion to the one fixed server-local time zone. A session
/// crossing midnight contributes to both days, per event, never per
/// session. Days outside the window are ignored.
pub struct DailyUsageBuilder {
    start: NaiveDate,
    days: Vec<TokenUsageSnapshot>,
}

impl DailyUsageBuilder {
    /// Window covers `[today - day_count + 1, today]`; `day_count` is
    /// clamped to at least one day.
    pub fn new(today: NaiveDate, day_count: u32) -> Self {
        let day_count = day_count.max(1);
        let start = today
            .checked_sub_days(Days::new(u64::from(day_count) - 1))
            .unwrap_or(today);
        Self {
            start,
            days: vec![TokenUsageSnapshot::default(); day_count as usize],
        }
    }

    pub fn add_events<Tz: TimeZone>(&mut self, events: &[SessionEvent], tz: &Tz) {
        for event in events {
            let EventPayload::TokenUsage(usage) = &event.payload else {
                continue;
            };
            let day = event.timestamp.with_timezone(tz).date_naive();
            let offset = day.signed_duration_since(self.start).num_days();
            if offset < 0 || offset >= self.days.len() as i64 {
                continue;
            }
            self.days[offset as usize].accumulate(&usage.usage);
        }
    }

    /// Ordered per-day snapshots, one entry per day in the window
    pub fn finish(self) -> Vec<DailyUsage> {
        self.days
            .into_iter()
            .enumerate()
            .map(|(i, usage)| DailyUsage {
                date: self.start + Days::new(i as u64),
                usage,
            })
            .collect()
    }
}

/// Convenience wrapper for a single event stream
pub fn daily_usage<Tz: TimeZone>(
    events: &[SessionEvent],
    day_count: u32,
    tz: &Tz,
    today: NaiveDate,
) -> Vec<DailyUsage> {
    let mut builder = DailyUsageBuilder::new(today, day_count);
    builder.add_events(events, tz);
    builder.finish()
}
