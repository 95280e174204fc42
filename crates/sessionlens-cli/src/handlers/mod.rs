pub mod detect;
pub mod messages;
pub mod sessions;
pub mod show;
pub mod usage;

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

/// Bold headings on a terminal, plain text when piped
pub(crate) fn heading(text: &str) -> String {
    if std::io::stdout().is_terminal() {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

pub(crate) fn dim(text: &str) -> String {
    if std::io::stdout().is_terminal() {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

/// Render a token count compactly (e.g. 12.4k)
pub(crate) fn format_tokens(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}k", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Render a duration compactly (e.g. 1m 04s)
pub(crate) fn format_duration_ms(ms: u64) -> String {
    let secs = ms / 1000;
    if secs >= 3600 {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", ms)
    }
}
