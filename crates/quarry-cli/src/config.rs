//! Configuration and path resolution for the CLI.
//!
//! Engine configuration is an optional TOML file. Search order:
//! 1. `--config <file>`
//! 2. `$QUARRY_CONFIG`
//! 3. `config.toml` in the platform config directory
//!
//! An explicitly named file (1 or 2) must exist; a missing file in the
//! platform directory just means defaults.

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use quarry_core::config::EngineConfig;
use std::path::{Path, PathBuf};
use tracing::info;

/// Config file name inside the platform config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Environment variable naming a config file
const CONFIG_ENV: &str = "QUARRY_CONFIG";

/// Where the engine configuration should come from.
#[derive(Debug, PartialEq)]
pub enum ConfigSource {
    /// A file the user named explicitly; it must exist
    Explicit(PathBuf),
    /// The platform default; optional
    Default(PathBuf),
    /// No location could be determined
    None,
}

/// Picks the config source from the flag, the environment and the platform dir.
pub fn resolve_config_source(
    custom: Option<&PathBuf>,
    env_value: Option<String>,
    default_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(path) = custom {
        return ConfigSource::Explicit(path.clone());
    }
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return ConfigSource::Explicit(PathBuf::from(value));
    }
    match default_dir {
        Some(dir) => ConfigSource::Default(dir.join(CONFIG_FILENAME)),
        None => ConfigSource::None,
    }
}

/// Returns the platform config directory.
///
/// - macOS: `~/Library/Application Support/dev.quarry.Quarry/`
/// - Linux: `~/.config/quarry/`
/// - Windows: `%APPDATA%\quarry\Quarry\config\`
pub fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "quarry", "Quarry")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the engine configuration, falling back to defaults.
pub fn load_engine_config(custom: Option<&PathBuf>) -> Result<EngineConfig> {
    let source = resolve_config_source(custom, std::env::var(CONFIG_ENV).ok(), get_config_dir());

    match source {
        ConfigSource::Explicit(path) => {
            if !path.exists() {
                return Err(anyhow!("Config file not found: {}", path.display()));
            }
            read_config(&path)
        }
        ConfigSource::Default(path) if path.exists() => read_config(&path),
        ConfigSource::Default(_) | ConfigSource::None => Ok(EngineConfig::default()),
    }
}

fn read_config(path: &Path) -> Result<EngineConfig> {
    info!("Loading config: {}", path.display());
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    EngineConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}
