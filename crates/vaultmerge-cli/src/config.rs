//! Configuration file handling.
//!
//! Reads from `~/.config/vaultmerge/vaultmerge.toml`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Defaults for a run. Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Merge duplicates instead of keeping only the latest revision.
    #[serde(default)]
    pub merge_mode: bool,
    /// Print every folder and item decision.
    #[serde(default)]
    pub verbose: bool,
    /// Walk remaining duplicate groups interactively after reconciliation.
    #[serde(default)]
    pub interactive: bool,
    /// Write a Markdown report next to the output file.
    #[serde(default = "default_write_report")]
    pub write_report: bool,
}

fn default_write_report() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            merge_mode: false,
            verbose: false,
            interactive: false,
            write_report: default_write_report(),
        }
    }
}

impl Config {
    /// Read run defaults from `custom_path`, or from the XDG location.
    ///
    /// A missing custom file is an error. A missing default file is created
    /// with default values.
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self> {
        let is_custom = custom_path.is_some();
        let config_path = match custom_path {
            Some(path) => path,
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            if is_custom {
                anyhow::bail!("Config file not found: {}", config_path.display());
            }
            let config = Config::default();
            if let Err(e) = config.save() {
                tracing::warn!("Could not create default config: {:#}", e);
            } else {
                tracing::info!("Created default config at {}", config_path.display());
            }
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        tracing::info!("Loaded config from {}: {:?}", config_path.display(), config);
        Ok(config)
    }

    /// Write these defaults to the XDG location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("vaultmerge").join("vaultmerge.toml"))
    }
}
