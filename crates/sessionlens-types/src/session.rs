use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identity of one logical session.
///
/// Some tools split a session across several transcript files (a main file
/// plus continuation/compaction files sharing the same session id), so
/// `source_files` can hold more than one path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    pub id: String,

    /// Working directory the session ran in, when the transcript records it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    pub source_files: Vec<PathBuf>,

    /// First real user message, truncated for listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl SessionMeta {
    pub fn new(id: impl Into<String>, source_file: PathBuf) -> Self {
        Self {
            id: id.into(),
            working_directory: None,
            created_at: None,
            source_files: vec![source_file],
            snippet: None,
        }
    }

    /// Merge another file's header for the same session id.
    ///
    /// Keeps the earliest creation time, the union of source files, and the
    /// first non-empty working directory/snippet.
    pub fn merge(&mut self, other: SessionMeta) {
        debug_assert_eq!(self.id, other.id);

        for file in other.source_files {
            if !self.source_files.contains(&file) {
                self.source_files.push(file);
            }
        }

        self.created_at = match (self.created_at, other.created_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        if self.working_directory.is_none() {
            self.working_directory = other.working_directory;
        }
        if self.snippet.is_none() {
            self.snippet = other.snippet;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_merge_keeps_earliest_created_at() {
        let mut a = SessionMeta::new("s1", PathBuf::from("/logs/a.jsonl"));
        a.created_at = Some(ts(2000));

        let mut b = SessionMeta::new("s1", PathBuf::from("/logs/b.jsonl"));
        b.created_at = Some(ts(1000));

        a.merge(b);
        assert_eq!(a.created_at, Some(ts(1000)));
        assert_eq!(a.source_files.len(), 2);
    }

    #[test]
    fn test_merge_unions_files_without_duplicates() {
        let mut a = SessionMeta::new("s1", PathBuf::from("/logs/a.jsonl"));
        let b = SessionMeta::new("s1", PathBuf::from("/logs/a.jsonl"));
        a.merge(b);
        assert_eq!(a.source_files.len(), 1);
    }

    #[test]
    fn test_merge_fills_missing_fields() {
        let mut a = SessionMeta::new("s1", PathBuf::from("/logs/a.jsonl"));
        let mut b = SessionMeta::new("s1", PathBuf::from("/logs/b.jsonl"));
        b.working_directory = Some(PathBuf::from("/home/user/proj"));
        b.snippet = Some("fix the bug".to_string());

        a.merge(b);
        assert_eq!(a.working_directory, Some(PathBuf::from("/home/user/proj")));
        assert_eq!(a.snippet.as_deref(), Some("fix the bug"));
    }
}
