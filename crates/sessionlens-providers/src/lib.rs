// Error types
pub mod error;

// Trait-based adapter interface (public API)
pub mod traits;

// Adapter implementations
pub mod claude;
pub mod codex;

// Tool call/result correlation
pub mod correlate;

// Session discovery scan
pub mod discovery;

// Streaming JSONL infrastructure
pub mod jsonl;

pub use claude::ClaudeAdapter;
pub use codex::CodexAdapter;
pub use correlate::{Pending, PendingTable};
pub use discovery::{ScanOutcome, scan_sessions};
pub use error::{Error, Result};
pub use jsonl::{EventIter, ParseStats};
pub use traits::{LogAdapter, adapter_for, all_adapters};
