use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sessionlens",
    version,
    about = "Reconstruct telemetry from AI coding agent transcripts"
)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List discovered sessions
    Sessions {
        /// Only sessions whose working directory is inside this path
        #[arg(long)]
        workspace: Option<PathBuf>,

        /// Only sessions from one tool (codex, claude)
        #[arg(long)]
        tool: Option<String>,
    },

    /// Show one session: counts, usage, activity timeline and trace
    Show {
        session_id: String,
    },

    /// Page through a session's conversation, newest page first
    Messages {
        session_id: String,

        /// Exclusive upper-bound entry index (from a previous page's cursor)
        #[arg(long)]
        before: Option<usize>,

        /// Page size (1-200)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Token usage aggregates across all configured tools
    Usage {
        /// Break usage down per day over the last N days
        #[arg(long)]
        days: Option<u32>,

        /// Bypass the aggregation cache
        #[arg(long)]
        refresh: bool,
    },

    /// Detect installed tools and write the default config
    Detect,
}
