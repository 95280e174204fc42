use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Machine-readable roll-up emitted when a scan finishes.
///
/// One explicit accumulator travels through the scan instead of counters
/// captured in closures, so the final numbers are the same ones the events
/// reported along the way.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    pub files_scanned: u64,
    pub files_failed: u64,
    pub sessions_found: u64,
    pub events_read: u64,
    pub lines_skipped: u64,
}

/// Scan-progress feed, delivered synchronously through a caller-supplied
/// hook. The transport (stdout, socket, whatever) is the caller's problem.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Started { tool: String, root: PathBuf },
    SessionLoaded { tool: String, session_id: String },
    FilesFailed { tool: String, count: u64 },
    Finished { summary: ScanSummary },
}

/// Synchronous progress callback
pub type ProgressHook<'a> = &'a (dyn Fn(ScanEvent) + Send + Sync);

pub(crate) fn emit(progress: Option<ProgressHook<'_>>, event: ScanEvent) {
    if let Some(hook) = progress {
        hook(event);
    }
}
