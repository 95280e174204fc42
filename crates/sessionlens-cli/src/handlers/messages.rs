use anyhow::Result;
use sessionlens_runtime::TelemetryService;
use sessionlens_types::{CancelToken, EventKind, Role};

use super::{dim, heading};

pub fn run(
    service: &TelemetryService,
    session_id: &str,
    before: Option<usize>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let cancel = CancelToken::new();
    let Some(page) = service.session_messages(session_id, before, limit, &cancel)? else {
        if json {
            println!("null");
        } else {
            println!("Session not found: {}", session_id);
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    for entry in &page.entries {
        let when = entry.timestamp.format("%H:%M:%S");
        match entry.kind {
            EventKind::ToolCall | EventKind::ToolResult => {
                let name = entry.tool_name.as_deref().unwrap_or("tool");
                let status = match entry.tool_is_error {
                    Some(true) => " (failed)",
                    Some(false) => "",
                    None => " (no result)",
                };
                println!("{} {}", dim(&when.to_string()), heading(&format!("[{}{}]", name, status)));
                if let Some(output) = &entry.tool_output {
                    for line in output.lines().take(3) {
                        println!("    {}", dim(line));
                    }
                }
            }
            _ => {
                let speaker = match entry.role {
                    Role::User => "user",
                    Role::Assistant => {
                        if entry.kind == EventKind::Reasoning {
                            "thinking"
                        } else {
                            "assistant"
                        }
                    }
                };
                println!("{} {}", dim(&when.to_string()), heading(speaker));
                if let Some(text) = &entry.text {
                    for line in text.lines().take(6) {
                        println!("    {}", line);
                    }
                }
            }
        }
    }

    if page.has_more
        && let Some(cursor) = page.next_cursor
    {
        println!();
        println!(
            "{}",
            dim(&format!("older entries available: --before {}", cursor))
        );
    }

    Ok(())
}
