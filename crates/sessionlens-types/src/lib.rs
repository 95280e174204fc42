pub mod cancel;
pub mod event;
pub mod path;
pub mod session;
pub mod usage;

pub use cancel::CancelToken;
pub use event::{
    EventKind, EventPayload, Role, SessionEvent, TokenUsagePayload, ToolCallPayload,
    ToolResultPayload,
};
pub use path::{normalize_path, path_contains, paths_equal};
pub use session::SessionMeta;
pub use usage::TokenUsageSnapshot;

/// Truncate a string to a maximum number of characters
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect::<String>() + "...(truncated)"
    }
}
