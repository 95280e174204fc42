use anyhow::{Result, bail};
use chrono::Local;
use sessionlens_engine::{
    DailyUsage, DailyUsageBuilder, MessagePage, SessionSummary, build_feed, load_session_events,
    paginate, summarize_session, total_usage,
};
use sessionlens_providers::{LogAdapter, adapter_for, scan_sessions};
use sessionlens_types::{CancelToken, SessionEvent, SessionMeta, TokenUsageSnapshot};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::AggregationCache;
use crate::config::Config;
use crate::progress::{ProgressHook, ScanEvent, ScanSummary, emit};

/// One configured transcript source
pub struct ToolSource {
    pub adapter: Box<dyn LogAdapter>,
    pub log_root: PathBuf,
}

/// A discovered session together with the tool that produced it
#[derive(Debug, Clone)]
pub struct ToolSession {
    pub tool: String,
    pub meta: SessionMeta,
}

/// The workspace-facing façade over discovery, the engine views, and the
/// aggregation cache. Constructed once per process and shared by request
/// handlers; the caches inside are the only cross-request mutable state.
pub struct TelemetryService {
    sources: Vec<ToolSource>,
    total_cache: AggregationCache<TokenUsageSnapshot>,
    daily_cache: AggregationCache<Vec<DailyUsage>>,
}

impl TelemetryService {
    pub fn new(config: &Config) -> Result<Self> {
        let mut sources = Vec::new();
        for (name, tool) in config.enabled_tools() {
            sources.push(ToolSource {
                adapter: adapter_for(name)?,
                log_root: tool.log_root.clone(),
            });
        }
        Ok(Self::from_sources(
            sources,
            Duration::from_secs(config.cache_ttl_secs),
        ))
    }

    pub fn from_sources(sources: Vec<ToolSource>, cache_ttl: Duration) -> Self {
        Self {
            sources,
            total_cache: AggregationCache::new(cache_ttl),
            daily_cache: AggregationCache::new(cache_ttl),
        }
    }

    /// List sessions across all sources, optionally filtered to one tool
    /// and to sessions owned by a workspace directory.
    pub fn list_sessions(
        &self,
        workspace: Option<&Path>,
        tool: Option<&str>,
        cancel: &CancelToken,
    ) -> Vec<ToolSession> {
        let mut sessions = Vec::new();
        for source in self.sources_for(tool) {
            let outcome = scan_sessions(source.adapter.as_ref(), &source.log_root, workspace, cancel);
            if outcome.io_errors > 0 {
                tracing::warn!(
                    tool = source.adapter.id(),
                    errors = outcome.io_errors,
                    "skipped unreadable transcript files"
                );
            }
            sessions.extend(outcome.sessions.into_iter().map(|meta| ToolSession {
                tool: source.adapter.id().to_string(),
                meta,
            }));
        }
        sessions.sort_by(|a, b| b.meta.created_at.cmp(&a.meta.created_at));
        sessions
    }

    /// Locate one session by id across all sources
    pub fn find_session(&self, session_id: &str, cancel: &CancelToken) -> Option<ToolSession> {
        for source in self.sources_for(None) {
            let outcome = scan_sessions(source.adapter.as_ref(), &source.log_root, None, cancel);
            if let Some(meta) = outcome.sessions.into_iter().find(|s| s.id == session_id) {
                return Some(ToolSession {
                    tool: source.adapter.id().to_string(),
                    meta,
                });
            }
        }
        None
    }

    /// Full summary (counts, usage, timeline, trace) for one session.
    /// `Ok(None)` when the id is unknown; an absent session is a result,
    /// not an error.
    pub fn session_summary(
        &self,
        session_id: &str,
        cancel: &CancelToken,
    ) -> Result<Option<SessionSummary>> {
        let Some(session) = self.find_session(session_id, cancel) else {
            return Ok(None);
        };
        let adapter = self.adapter(&session.tool)?;
        let (events, _) = load_session_events(adapter, &session.meta, cancel);
        if cancel.is_cancelled() {
            bail!("scan cancelled");
        }
        Ok(Some(summarize_session(&session.meta, &events)))
    }

    /// One page of the deduplicated conversation view
    pub fn session_messages(
        &self,
        session_id: &str,
        before: Option<usize>,
        limit: Option<usize>,
        cancel: &CancelToken,
    ) -> Result<Option<MessagePage>> {
        let Some(session) = self.find_session(session_id, cancel) else {
            return Ok(None);
        };
        let adapter = self.adapter(&session.tool)?;
        let (events, _) = load_session_events(adapter, &session.meta, cancel);
        if cancel.is_cancelled() {
            bail!("scan cancelled");
        }
        let feed = build_feed(&session.meta.id, &events);
        Ok(Some(paginate(&feed, before, limit)))
    }

    /// Whole-directory usage total, cached behind the single-flight lock.
    /// Missing transcript roots contribute zero and cache like any other
    /// result.
    pub fn usage_total(
        &self,
        force_refresh: bool,
        cancel: &CancelToken,
        progress: Option<ProgressHook<'_>>,
    ) -> Result<TokenUsageSnapshot> {
        self.total_cache.get_or_compute("usage:total", force_refresh, || {
            let mut total = TokenUsageSnapshot::default();
            self.walk_all_sessions(cancel, progress, |events| {
                total.accumulate(&total_usage(events));
            })?;
            Ok(total)
        })
    }

    /// Per-day usage over `[today - days + 1, today]` in server-local time
    pub fn usage_daily(
        &self,
        days: u32,
        force_refresh: bool,
        cancel: &CancelToken,
        progress: Option<ProgressHook<'_>>,
    ) -> Result<Vec<DailyUsage>> {
        let key = format!("usage:daily:{}", days);
        self.daily_cache.get_or_compute(&key, force_refresh, || {
            let mut builder = DailyUsageBuilder::new(Local::now().date_naive(), days);
            self.walk_all_sessions(cancel, progress, |events| {
                builder.add_events(events, &Local);
            })?;
            Ok(builder.finish())
        })
    }

    /// Scan every source and feed each session's deduplicated event stream
    /// to `consume`. Cancellation aborts with an error so nothing partial
    /// gets cached.
    fn walk_all_sessions(
        &self,
        cancel: &CancelToken,
        progress: Option<ProgressHook<'_>>,
        mut consume: impl FnMut(&[SessionEvent]),
    ) -> Result<()> {
        let mut summary = ScanSummary::default();

        for source in &self.sources {
            let tool = source.adapter.id().to_string();
            emit(
                progress,
                ScanEvent::Started {
                    tool: tool.clone(),
                    root: source.log_root.clone(),
                },
            );

            let outcome =
                scan_sessions(source.adapter.as_ref(), &source.log_root, None, cancel);
            summary.files_scanned += outcome.files_seen;
            let mut failed_for_tool = outcome.io_errors;

            for meta in outcome.sessions {
                if cancel.is_cancelled() {
                    bail!("scan cancelled");
                }

                let (events, report) =
                    load_session_events(source.adapter.as_ref(), &meta, cancel);
                summary.sessions_found += 1;
                summary.events_read += events.len() as u64;
                summary.lines_skipped += report.lines_skipped;
                failed_for_tool += report.files_failed;
                emit(
                    progress,
                    ScanEvent::SessionLoaded {
                        tool: tool.clone(),
                        session_id: meta.id.clone(),
                    },
                );

                consume(&events);
            }

            summary.files_failed += failed_for_tool;
            if failed_for_tool > 0 {
                emit(
                    progress,
                    ScanEvent::FilesFailed {
                        tool: tool.clone(),
                        count: failed_for_tool,
                    },
                );
            }
        }

        if cancel.is_cancelled() {
            bail!("scan cancelled");
        }

        emit(progress, ScanEvent::Finished { summary });
        Ok(())
    }

    fn sources_for(&self, tool: Option<&str>) -> impl Iterator<Item = &ToolSource> {
        self.sources
            .iter()
            .filter(move |source| tool.is_none_or(|t| t == source.adapter.id()))
    }

    fn adapter(&self, tool: &str) -> Result<&dyn LogAdapter> {
        self.sources
            .iter()
            .find(|source| source.adapter.id() == tool)
            .map(|source| source.adapter.as_ref())
            .ok_or_else(|| anyhow::anyhow!("no configured source for tool: {}", tool))
    }
}
