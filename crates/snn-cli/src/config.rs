//! Persistent CLI configuration (distinct from [`snn_core::TrainingConfig`],
//! which governs the trainer itself). Ambient CLI ergonomics: default
//! scenario/output path and log level, loaded from a TOML file in the
//! platform config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// User-level CLI preferences, independent of any one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default `.net` path, used when `--net` is omitted.
    pub default_net: Option<String>,
    /// Default output path for JSON results.
    pub default_output: Option<String>,
    /// Default `tracing` log level (`error`, `warn`, `info`, `debug`, `trace`).
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_net: None,
            default_output: None,
            log_level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load from `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| CliError::config(format!("invalid config file {}: {e}", path.display())))
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| CliError::config(format!("failed to serialize config: {e}")))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        Ok(())
    }

    /// The conventional per-user config file path, `<config_dir>/snn/config.toml`.
    pub fn default_path() -> CliResult<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| CliError::config("could not determine platform config directory"))?;
        Ok(dir.join("snn").join("config.toml"))
    }
}
