use anyhow::Result;
use sessionlens_runtime::Config;

pub fn run(json: bool) -> Result<()> {
    let config = Config::detect_tools();
    config.save()?;

    if json {
        let rows: Vec<serde_json::Value> = config
            .tools
            .iter()
            .map(|(name, tool)| {
                serde_json::json!({
                    "tool": name,
                    "log_root": tool.log_root,
                    "enabled": tool.enabled,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if config.tools.is_empty() {
        println!("No tool transcript directories found.");
    } else {
        for (name, tool) in &config.tools {
            println!("{}: {}", name, tool.log_root.display());
        }
    }
    println!("Config written to {}", Config::default_path()?.display());

    Ok(())
}
