use crate::types::ColorChoice;
use anyhow::{Context, Result};
use asadm_engine::histogram::DEFAULT_BUCKET_COUNT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Resolve the config file path based on priority:
/// 1. Explicit path (`--config`)
/// 2. ASADM_CONFIG environment variable
/// 3. `<config dir>/asadm/config.toml`
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var("ASADM_CONFIG") {
        return Ok(PathBuf::from(env_path));
    }

    dirs::config_dir()
        .map(|dir| dir.join("asadm").join("config.toml"))
        .context("could not determine a config directory; pass --config")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Shown for cells a node had no data for.
    pub no_entry: String,
    /// Shown for cells whose data could not be fetched or read.
    pub error_entry: String,
    /// Repeat the title column when a listing is wider than the terminal.
    pub title_repeat: bool,
    pub color: ColorChoice,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            no_entry: "--".to_string(),
            error_entry: "~~".to_string(),
            title_repeat: true,
            color: ColorChoice::Auto,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    pub allow_unstable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub bucket_count: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub license: LicenseConfig,
    #[serde(default)]
    pub histogram: HistogramConfig,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.display.no_entry, "--");
        assert_eq!(config.display.error_entry, "~~");
        assert_eq!(config.histogram.bucket_count, 5);
        assert!(!config.license.allow_unstable);
    }

    #[test]
    fn test_config_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.display.color = ColorChoice::Never;
        config.histogram.bucket_count = 8;

        config.save_to(&config_path)?;
        assert!(config_path.exists());

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(loaded, config);

        Ok(())
    }

    #[test]
    fn test_partial_config_keeps_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[display]\nno_entry = \"N/E\"\n")?;

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(loaded.display.no_entry, "N/E");
        assert_eq!(loaded.display.error_entry, "~~");
        assert_eq!(loaded.histogram.bucket_count, 5);

        Ok(())
    }

    #[test]
    fn test_load_nonexistent_returns_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path)?;
        assert_eq!(config, Config::default());

        Ok(())
    }

    #[test]
    fn test_explicit_path_wins() -> Result<()> {
        let path = PathBuf::from("/tmp/asadm.toml");
        assert_eq!(resolve_config_path(Some(&path))?, path);
        Ok(())
    }
}
