use anyhow::{Context, Result};
use serde::Deserialize;
use std::str::FromStr;

/// Settings bundled into the worker at build time
pub const BUNDLED_CONFIG: &str = include_str!("../background.toml");

#[derive(Debug, Default, Deserialize)]
pub struct BackgroundConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub airtable: AirtableSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String, // "error", "warn", "info", "debug" or "trace"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AirtableSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for AirtableSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_api_url() -> String {
    airtable_client::DEFAULT_API_URL.to_string()
}

impl BackgroundConfig {
    pub fn bundled() -> Result<Self> {
        Self::from_toml(BUNDLED_CONFIG).context("Invalid bundled background.toml")
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.log_level()?;

        let scheme = self
            .airtable
            .api_url
            .split_once("://")
            .map(|(scheme, _)| scheme);
        match scheme {
            Some("http") | Some("https") => Ok(()),
            _ => anyhow::bail!(
                "Invalid airtable.api_url: {}. Must be an http(s) URL",
                self.airtable.api_url
            ),
        }
    }

    pub fn log_level(&self) -> Result<log::Level> {
        log::Level::from_str(&self.logging.level).map_err(|_| {
            anyhow::anyhow!(
                "Invalid logging.level: {}. Must be 'error', 'warn', 'info', 'debug' or 'trace'",
                self.logging.level
            )
        })
    }
}
