mod io;
mod mapper;
mod schema;

use sessionlens_types::{CancelToken, SessionMeta};
use std::path::{Path, PathBuf};

use crate::Result;
use crate::jsonl::EventIter;
use crate::traits::LogAdapter;

/// Adapter for claude transcripts.
///
/// Records carry `type`/`message`/`cwd`/`sessionId` at the top level with
/// message content as typed part arrays; token usage is reported once per
/// assistant message and deduplicated session-wide by message id.
pub struct ClaudeAdapter;

impl LogAdapter for ClaudeAdapter {
    fn id(&self) -> &'static str {
        "claude"
    }

    fn default_log_root(&self) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".claude").join("projects"))
    }

    fn probe(&self, path: &Path) -> bool {
        path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl")
    }

    fn read_header(&self, path: &Path) -> Result<Option<SessionMeta>> {
        io::read_claude_header(path)
    }

    fn events(&self, path: &Path, cancel: CancelToken) -> Result<EventIter> {
        EventIter::open(path, Box::new(mapper::ClaudeMapper::new()), cancel)
    }
}
