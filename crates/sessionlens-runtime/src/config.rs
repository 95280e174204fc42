use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolve the data directory path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. SESSIONLENS_PATH environment variable (with tilde expansion)
/// 3. System data directory
/// 4. ~/.sessionlens (fallback for systems without a standard data directory)
pub fn resolve_data_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("SESSIONLENS_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("sessionlens"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".sessionlens"));
    }

    Err(Error::Config(
        "Could not determine data path: no HOME directory or system data directory found"
            .to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub enabled: bool,
    pub log_root: PathBuf,
}

fn default_cache_ttl_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tools: HashMap<String, ToolConfig>,

    /// How long whole-directory aggregates stay fresh
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tools: HashMap::new(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(resolve_data_path(None)?.join("config.toml"))
    }

    /// Enable every built-in adapter whose default transcript root exists
    pub fn detect_tools() -> Self {
        let mut tools = HashMap::new();

        for adapter in sessionlens_providers::all_adapters() {
            if let Some(root) = adapter.default_log_root()
                && root.is_dir()
            {
                tools.insert(
                    adapter.id().to_string(),
                    ToolConfig {
                        enabled: true,
                        log_root: root,
                    },
                );
            }
        }

        Config {
            tools,
            ..Self::default()
        }
    }

    pub fn enabled_tools(&self) -> Vec<(&String, &ToolConfig)> {
        self.tools
            .iter()
            .filter(|(_, tool)| tool.enabled)
            .collect()
    }

    pub fn set_tool(&mut self, name: String, tool: ToolConfig) {
        self.tools.insert(name, tool);
    }
}
