use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: PathBuf,
    #[serde(default = "default_issues_path")]
    pub issues_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            metadata_dir: default_metadata_dir(),
            issues_path: default_issues_path(),
        }
    }
}

fn default_metadata_dir() -> PathBuf {
    PathBuf::from("data/parsed_metadata")
}
fn default_issues_path() -> PathBuf {
    PathBuf::from("data/historical_issues/issues_export.csv")
}

/// Rendering and lookup limits. Passed explicitly into the assembler and the
/// issue index so behavior is reproducible under test without environment
/// setup.
#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    /// Maximum historical issues returned per query.
    #[serde(default = "default_max_issues")]
    pub max_issues: usize,
    /// Maximum calculated fields rendered before the "and N more" trailer.
    #[serde(default = "default_max_calculated_fields")]
    pub max_calculated_fields: usize,
    /// Maximum filters rendered.
    #[serde(default = "default_max_filters")]
    pub max_filters: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_issues: default_max_issues(),
            max_calculated_fields: default_max_calculated_fields(),
            max_filters: default_max_filters(),
        }
    }
}

fn default_max_issues() -> usize {
    5
}
fn default_max_calculated_fields() -> usize {
    10
}
fn default_max_filters() -> usize {
    5
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.context.max_issues == 0 {
        anyhow::bail!("context.max_issues must be >= 1");
    }
    if config.context.max_calculated_fields == 0 {
        anyhow::bail!("context.max_calculated_fields must be >= 1");
    }
    if config.context.max_filters == 0 {
        anyhow::bail!("context.max_filters must be >= 1");
    }

    Ok(config)
}
