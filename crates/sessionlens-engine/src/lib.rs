// Engine layer: every view of a session's canonical event stream.
// Sits between the adapters (sessionlens-providers) and the service/API
// surface (sessionlens-runtime).

pub mod accounting;
pub mod feed;
pub mod session;
pub mod summary;
pub mod timeline;
pub mod trace;

pub use accounting::{DailyUsage, DailyUsageBuilder, daily_usage, total_usage};
pub use feed::{MessageEntry, MessagePage, build_feed, paginate};
pub use session::{LoadReport, load_session_events};
pub use summary::{SessionSummary, summarize_session};
pub use timeline::{KindCounts, build_timeline, count_events};
pub use trace::{SpanKind, TraceSpan, reconstruct_trace};
