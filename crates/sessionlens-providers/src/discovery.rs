use sessionlens_types::{CancelToken, SessionMeta, path_contains};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use walkdir::WalkDir;

use crate::traits::LogAdapter;

/// Result of one discovery scan. IO failures are per-file and non-fatal;
/// they are counted here instead of aborting the walk.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub sessions: Vec<SessionMeta>,
    pub files_seen: u64,
    pub io_errors: u64,
}

/// Enumerate an adapter's transcript root and assemble session identities.
///
/// Headers are extracted cheaply (no body parse); files sharing a session
/// id merge into one `SessionMeta` with the earliest creation time and the
/// union of source files. When `workspace` is given, only sessions whose
/// working directory equals it or lives underneath it survive.
///
/// A missing root is not an error: it yields an empty outcome.
pub fn scan_sessions(
    adapter: &dyn LogAdapter,
    root: &Path,
    workspace: Option<&Path>,
    cancel: &CancelToken,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    if !root.is_dir() {
        return outcome;
    }

    let mut by_id: HashMap<String, SessionMeta> = HashMap::new();

    for entry in WalkDir::new(root).into_iter() {
        if cancel.is_cancelled() {
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => {
                outcome.io_errors += 1;
                continue;
            }
        };
        let path = entry.path();
        if !adapter.probe(path) {
            continue;
        }
        outcome.files_seen += 1;

        match adapter.read_header(path) {
            Ok(Some(meta)) => match by_id.entry(meta.id.clone()) {
                Entry::Occupied(mut slot) => slot.get_mut().merge(meta),
                Entry::Vacant(slot) => {
                    slot.insert(meta);
                }
            },
            // No recognizable identity; not an error
            Ok(None) => {}
            Err(_) => outcome.io_errors += 1,
        }
    }

    let mut sessions: Vec<SessionMeta> = by_id
        .into_values()
        .filter(|meta| match workspace {
            Some(workspace) => meta
                .working_directory
                .as_deref()
                .is_some_and(|dir| path_contains(workspace, dir)),
            None => true,
        })
        .collect();

    // Most recent first; undated sessions sink to the end
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    outcome.sessions = sessions;
    outcome
}
