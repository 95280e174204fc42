use anyhow::Result;
use sessionlens_engine::SpanKind;
use sessionlens_runtime::TelemetryService;
use sessionlens_types::CancelToken;

use super::{dim, format_duration_ms, format_tokens, heading};

pub fn run(service: &TelemetryService, session_id: &str, json: bool) -> Result<()> {
    let cancel = CancelToken::new();
    let Some(summary) = service.session_summary(session_id, &cancel)? else {
        if json {
            println!("null");
        } else {
            println!("Session not found: {}", session_id);
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", heading(&format!("Session {}", summary.id)));
    if let Some(created) = summary.created_at {
        println!("  started   {}", created.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("  duration  {}", format_duration_ms(summary.duration_ms));
    println!(
        "  events    {} messages, {} tool calls, {} reasoning",
        summary.event_counts.messages,
        summary.event_counts.tool_calls,
        summary.event_counts.reasoning,
    );
    println!(
        "  tokens    {} total ({} prefill, {} generated)",
        format_tokens(summary.token_usage.total_tokens()),
        format_tokens(summary.token_usage.prefill_tokens()),
        format_tokens(summary.token_usage.gen_tokens()),
    );

    if !summary.timeline.is_empty() {
        println!();
        println!("{}", heading("Activity"));
        println!("  {}", render_activity_bar(&summary.timeline));
    }

    if !summary.trace.is_empty() {
        println!();
        println!("{}", heading("Trace"));
        for span in &summary.trace {
            let label = match span.kind {
                SpanKind::Tool => "tool",
                SpanKind::Waiting => "waiting",
                SpanKind::Think => "think",
                SpanKind::Gen => "gen",
            };
            let tokens = if span.token_count > 0 {
                format!("  {} tokens", format_tokens(span.token_count))
            } else {
                String::new()
            };
            println!(
                "  {:7} {:>9}{}",
                label,
                format_duration_ms(span.duration_ms),
                dim(&tokens)
            );
        }
    }

    Ok(())
}

/// One character per bucket, scaled against the busiest bucket
fn render_activity_bar(timeline: &[sessionlens_engine::KindCounts]) -> String {
    const LEVELS: [char; 5] = [' ', '▂', '▄', '▆', '█'];

    let max = timeline.iter().map(|b| b.total()).max().unwrap_or(0);
    if max == 0 {
        return String::new();
    }

    timeline
        .iter()
        .map(|bucket| {
            let level = (bucket.total() as usize * (LEVELS.len() - 1)).div_ceil(max as usize);
            LEVELS[level.min(LEVELS.len() - 1)]
        })
        .collect()
}
