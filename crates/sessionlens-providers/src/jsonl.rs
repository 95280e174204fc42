use chrono::{DateTime, Utc};
use sessionlens_types::{CancelToken, SessionEvent};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use crate::Result;

/// How often the streaming iterator checks the cancellation token.
const CANCEL_CHECK_INTERVAL: u64 = 64;

/// Per-file parse counters, readable from an [`EventIter`] at any point.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseStats {
    pub lines_read: u64,
    pub lines_skipped: u64,
}

/// Adapter-specific line-to-events mapping.
///
/// Mappers are stateful per file: they hold the pending tool correlation
/// table and (for cumulative-counter tools) the last usage snapshot, both of
/// which reset when a new file is opened.
pub(crate) trait RecordMapper: Send {
    /// Map one raw line to zero or more canonical events.
    ///
    /// `Err` means the line is malformed or unusable (bad JSON, missing
    /// timestamp) and should be counted as skipped; `Ok(vec![])` means the
    /// record parsed fine but carries nothing the canonical stream needs.
    fn map_line(&mut self, line: &str) -> Result<Vec<SessionEvent>>;

    /// Flush anything still buffered at end of file (e.g. tool results that
    /// never saw their call).
    fn finish(&mut self) -> Vec<SessionEvent>;
}

/// Lazy event stream over one line-delimited JSON transcript file.
///
/// Lines stream through a `BufReader` (multi-gigabyte transcripts must not
/// be buffered whole), malformed lines are skipped individually, and the
/// cancellation token is consulted every [`CANCEL_CHECK_INTERVAL`] lines.
/// Restart by constructing a fresh iterator for the same path.
pub struct EventIter {
    lines: Lines<BufReader<File>>,
    mapper: Box<dyn RecordMapper>,
    queue: VecDeque<SessionEvent>,
    stats: ParseStats,
    cancel: CancelToken,
    at_first_line: bool,
    done: bool,
}

impl EventIter {
    pub(crate) fn open(
        path: &Path,
        mapper: Box<dyn RecordMapper>,
        cancel: CancelToken,
    ) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            mapper,
            queue: VecDeque::new(),
            stats: ParseStats::default(),
            cancel,
            at_first_line: true,
            done: false,
        })
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }
}

impl Iterator for EventIter {
    type Item = SessionEvent;

    fn next(&mut self) -> Option<SessionEvent> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Some(event);
            }
            if self.done {
                return None;
            }
            if self.stats.lines_read % CANCEL_CHECK_INTERVAL == 0 && self.cancel.is_cancelled() {
                self.done = true;
                return None;
            }

            match self.lines.next() {
                None => {
                    self.done = true;
                    self.queue.extend(self.mapper.finish());
                }
                Some(Err(_)) => {
                    self.stats.lines_read += 1;
                    self.stats.lines_skipped += 1;
                }
                Some(Ok(raw)) => {
                    self.stats.lines_read += 1;
                    let mut line = raw.as_str();
                    if self.at_first_line {
                        line = line.strip_prefix('\u{feff}').unwrap_or(line);
                        self.at_first_line = false;
                    }
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match self.mapper.map_line(line) {
                        Ok(events) => self.queue.extend(events),
                        Err(_) => self.stats.lines_skipped += 1,
                    }
                }
            }
        }
    }
}

/// Parse an RFC3339/ISO-8601 timestamp into UTC.
///
/// Returns `None` on failure: records without a usable timestamp are
/// excluded entirely rather than attributed to "now".
pub(crate) fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
