use anyhow::Result;
use clap::Args;
use colored::Colorize;
use scribe_engine::{EngineConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Debounce for cached (typing) batches, in milliseconds
    #[arg(long, default_value = "10")]
    pub debounce: u64,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = EngineConfig {
        cache_debounce_ms: args.debounce,
        ..EngineConfig::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = TempDir::new().unwrap();
        init(InitArgs { debounce: 40, force: false }, dir.path()).unwrap();

        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config.cache_debounce_ms, 40);
        assert!(config.normalize_styles);
    }

    #[test]
    fn test_init_keeps_existing_config_without_force() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{"cacheDebounceMs": 7}"#).unwrap();

        init(InitArgs { debounce: 40, force: false }, dir.path()).unwrap();
        assert_eq!(EngineConfig::load(dir.path()).unwrap().cache_debounce_ms, 7);

        init(InitArgs { debounce: 40, force: true }, dir.path()).unwrap();
        assert_eq!(EngineConfig::load(dir.path()).unwrap().cache_debounce_ms, 40);
    }
}
