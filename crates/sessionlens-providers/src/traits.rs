use sessionlens_types::{CancelToken, SessionMeta};
use std::path::{Path, PathBuf};

use crate::jsonl::EventIter;
use crate::{Error, Result};

/// One transcript source.
///
/// Responsibilities:
/// - Locate and recognize this tool's transcript files
/// - Extract session identity cheaply (no full parse)
/// - Stream a file's records as canonical events
pub trait LogAdapter: Send + Sync {
    /// Unique adapter ID (e.g. "codex", "claude")
    fn id(&self) -> &'static str;

    /// Default transcript root under the user's home directory
    fn default_log_root(&self) -> Option<PathBuf>;

    /// Check if a file belongs to this adapter
    fn probe(&self, path: &Path) -> bool;

    /// Extract session identity from the file header.
    ///
    /// Returns `Ok(None)` for files without a recognizable identity;
    /// malformed content is never an error, only unreadable files are.
    fn read_header(&self, path: &Path) -> Result<Option<SessionMeta>>;

    /// Open a lazy, restartable-per-file event stream.
    ///
    /// Malformed lines are skipped individually (counted in the iterator's
    /// stats), never fatal for the file.
    fn events(&self, path: &Path, cancel: CancelToken) -> Result<EventIter>;
}

/// All built-in adapters
pub fn all_adapters() -> Vec<Box<dyn LogAdapter>> {
    vec![
        Box::new(crate::codex::CodexAdapter),
        Box::new(crate::claude::ClaudeAdapter),
    ]
}

/// Look up a single adapter by name
pub fn adapter_for(name: &str) -> Result<Box<dyn LogAdapter>> {
    match name {
        "codex" => Ok(Box::new(crate::codex::CodexAdapter)),
        "claude" | "claude_code" => Ok(Box::new(crate::claude::ClaudeAdapter)),
        other => Err(Error::Adapter(format!("unknown adapter: {}", other))),
    }
}
