use anyhow::Result;
use sessionlens_runtime::{ScanEvent, TelemetryService};
use sessionlens_types::CancelToken;

use super::{format_tokens, heading};

pub fn run(
    service: &TelemetryService,
    days: Option<u32>,
    refresh: bool,
    json: bool,
) -> Result<()> {
    let cancel = CancelToken::new();

    // Human-readable scan progress on stderr; results stay on stdout
    let progress = |event: ScanEvent| match event {
        ScanEvent::Started { tool, root } => {
            eprintln!("scanning {} transcripts in {}", tool, root.display());
        }
        ScanEvent::SessionLoaded { tool, session_id } => {
            eprintln!("  {} session {}", tool, session_id);
        }
        ScanEvent::FilesFailed { tool, count } => {
            eprintln!("  {}: skipped {} unreadable file(s)", tool, count);
        }
        ScanEvent::Finished { summary } => {
            eprintln!(
                "scan finished: {}",
                serde_json::to_string(&summary).unwrap_or_default()
            );
        }
    };

    match days {
        Some(days) => {
            let daily = service.usage_daily(days, refresh, &cancel, Some(&progress))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&daily)?);
                return Ok(());
            }

            println!("{}", heading(&format!("Token usage, last {} day(s)", days)));
            for day in &daily {
                println!(
                    "  {}  {:>8} total  ({} in, {} cached, {} out)",
                    day.date,
                    format_tokens(day.usage.total_tokens()),
                    format_tokens(day.usage.input_tokens),
                    format_tokens(day.usage.cached_input_tokens),
                    format_tokens(day.usage.gen_tokens()),
                );
            }
        }
        None => {
            let total = service.usage_total(refresh, &cancel, Some(&progress))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&total)?);
                return Ok(());
            }

            println!("{}", heading("Token usage, all sessions"));
            println!("  input      {:>10}", format_tokens(total.input_tokens));
            println!(
                "  cached     {:>10}",
                format_tokens(total.cached_input_tokens)
            );
            println!("  output     {:>10}", format_tokens(total.output_tokens));
            println!(
                "  reasoning  {:>10}",
                format_tokens(total.reasoning_output_tokens)
            );
            println!("  total      {:>10}", format_tokens(total.total_tokens()));
        }
    }

    Ok(())
}
