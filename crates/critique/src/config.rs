//! Project configuration file support for critique.
//!
//! Loads configuration from `critique.toml` in the working directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Project-level configuration loaded from `critique.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Agent that runs the critique turn ("claude" or "opencode")
    pub agent: Option<String>,
    /// Model passed to the agent
    pub model: Option<String>,
    /// Files longer than this are critiqued by reference
    pub large_file_lines: Option<usize>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "critique.toml";

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        if config.large_file_lines == Some(0) {
            anyhow::bail!(
                "{}: large_file_lines must be at least 1",
                config_path.display()
            );
        }

        Ok(Some(config))
    }
}
