//! Configuration file structures
//! 
//! A configuration file carries a `prach` section with the generation
//! parameters and an optional `log` section. YAML, TOML and JSON are accepted.

use phy::PrachConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeneratorConfig {
    /// PRACH generation parameters
    #[serde(default)]
    pub prach: PrachConfig,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// PHY log level
    #[serde(default = "default_log_level")]
    pub phy_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            phy_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LogConfig {
    /// Filter directive for tracing-subscriber
    pub fn filter_directive(&self) -> String {
        format!("{},phy={}", self.level, self.phy_level)
    }
}

impl GeneratorConfig {
    /// Load configuration from a file, picking the format from its extension
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::parse(&contents, extension)
    }
    
    /// Parse configuration text of the given format
    pub fn parse(contents: &str, format: &str) -> anyhow::Result<Self> {
        let config: GeneratorConfig = match format {
            "yml" | "yaml" => serde_yaml::from_str(contents)?,
            "toml" => toml::from_str(contents)?,
            "json" => serde_json::from_str(contents)?,
            other => return Err(anyhow::anyhow!("Unsupported configuration format: {:?}", other)),
        };
        config.prach.validate()?;
        Ok(config)
    }
}
