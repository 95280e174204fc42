use anyhow::Result;
use sessionlens_runtime::TelemetryService;
use sessionlens_types::CancelToken;
use std::path::Path;

use super::{dim, heading};

pub fn run(
    service: &TelemetryService,
    workspace: Option<&Path>,
    tool: Option<&str>,
    json: bool,
) -> Result<()> {
    let cancel = CancelToken::new();
    let sessions = service.list_sessions(workspace, tool, &cancel);

    if json {
        let rows: Vec<serde_json::Value> = sessions
            .iter()
            .map(|session| {
                serde_json::json!({
                    "tool": session.tool,
                    "id": session.meta.id,
                    "created_at": session.meta.created_at,
                    "working_directory": session.meta.working_directory,
                    "source_files": session.meta.source_files.len(),
                    "snippet": session.meta.snippet,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    println!("{}", heading(&format!("{} session(s)", sessions.len())));
    for session in &sessions {
        let when = session
            .meta
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown time".to_string());
        println!(
            "  {:8} {}  {}",
            session.tool,
            session.meta.id,
            dim(&when)
        );
        if let Some(snippet) = &session.meta.snippet {
            println!("           {}", dim(snippet));
        }
    }

    Ok(())
}
