pub mod cache;
pub mod config;
pub mod error;
pub mod progress;
pub mod services;

pub use cache::{AggregationCache, DEFAULT_TTL};
pub use config::{Config, ToolConfig, resolve_data_path};
pub use error::{Error, Result};
pub use progress::{ProgressHook, ScanEvent, ScanSummary};
pub use services::{TelemetryService, ToolSession, ToolSource};
