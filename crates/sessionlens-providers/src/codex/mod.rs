mod io;
mod mapper;
mod schema;

use sessionlens_types::{CancelToken, SessionMeta};
use std::path::{Path, PathBuf};

use crate::Result;
use crate::jsonl::EventIter;
use crate::traits::LogAdapter;

/// Adapter for codex rollout transcripts.
///
/// Records wrap a type discriminator and payload under a `payload` object;
/// token usage arrives as a cumulative "total so far" counter that the
/// mapper diffs per file.
pub struct CodexAdapter;

impl LogAdapter for CodexAdapter {
    fn id(&self) -> &'static str {
        "codex"
    }

    fn default_log_root(&self) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".codex").join("sessions"))
    }

    fn probe(&self, path: &Path) -> bool {
        path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl")
    }

    fn read_header(&self, path: &Path) -> Result<Option<SessionMeta>> {
        io::read_codex_header(path)
    }

    fn events(&self, path: &Path, cancel: CancelToken) -> Result<EventIter> {
        EventIter::open(path, Box::new(mapper::CodexMapper::new()), cancel)
    }
}
