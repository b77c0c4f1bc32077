//! Settings and settings-file location.
//!
//! Settings are optional: a missing `trackcfg.json` means defaults, which
//! match the naming conventions of the hgTrackUi configuration page.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file name inside the config directory
pub const SETTINGS_FILE: &str = "trackcfg.json";

/// Payload encoding written by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// application/x-www-form-urlencoded
    #[default]
    Query,
    Json,
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Suffix of view-level visibility controls (`composite.view.vis`)
    pub visibility_suffix: String,
    /// Suffix of subtrack selection checkboxes (`subtrack_sel`)
    pub selection_suffix: String,
    /// Prefix of checkbox shadow fields
    pub shadow_prefix: String,
    /// Hidden-field suffixes carrying ordering/position data
    pub structural_suffixes: Vec<String>,
    pub output_format: OutputFormat,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            visibility_suffix: "vis".to_string(),
            selection_suffix: "sel".to_string(),
            shadow_prefix: "boolshad.".to_string(),
            structural_suffixes: vec!["priority".to_string(), "sortOrder".to_string()],
            output_format: OutputFormat::Query,
        }
    }
}

impl EngineSettings {
    /// Load settings from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings: EngineSettings = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write settings: {}", path.display()))?;
        Ok(())
    }

    pub fn is_structural_suffix(&self, suffix: &str) -> bool {
        self.structural_suffixes.iter().any(|s| s == suffix)
    }
}

/// Configuration for overriding the default settings directory
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var (TRACKCFG_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| {
            std::env::var("TRACKCFG_CONFIG_DIR")
                .ok()
                .map(PathBuf::from)
        });

        Self { config_dir }
    }
}

/// Get path to a configuration file
///
/// Priority:
/// 1. CLI --config-dir argument
/// 2. TRACKCFG_CONFIG_DIR environment variable
/// 3. Local folder IF trackcfg.json exists there
/// 4. Platform-specific config directory from dirs-next
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

/// Create the config directory if missing
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let dir = get_config_dir(config);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    }
    Ok(())
}

fn get_config_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if current_dir.join(SETTINGS_FILE).exists() {
            return current_dir;
        }
    }

    if let Some(dir) = dirs_next::config_dir() {
        return dir.join("trackcfg");
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EngineSettings::load(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert!(settings.is_structural_suffix("priority"));
        assert!(!settings.is_structural_suffix("color"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let settings = EngineSettings {
            structural_suffixes: vec!["order".to_string()],
            output_format: OutputFormat::Json,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(EngineSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"shadow_prefix": "shad."}"#).unwrap();
        let settings = EngineSettings::load(&path).unwrap();
        assert_eq!(settings.shadow_prefix, "shad.");
        assert_eq!(settings.visibility_suffix, "vis");
    }

    #[test]
    fn test_ensure_dirs_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let cfg = PathConfig::from_env_and_cli(Some(nested.clone()));
        ensure_dirs(&cfg).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_cli_dir_wins() {
        let cfg = PathConfig::from_env_and_cli(Some(PathBuf::from("/tmp/tc")));
        assert_eq!(config_file(SETTINGS_FILE, &cfg), PathBuf::from("/tmp/tc/trackcfg.json"));
    }
}
