use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// Connection settings the side panel sends along with each request
#[derive(Debug, Clone, Deserialize)]
pub struct AirtableConfig {
    /// Personal access token (older builds of the panel call it `token`)
    #[serde(rename = "apiKey", alias = "token", default)]
    pub api_key: String,
    #[serde(rename = "baseId", default)]
    pub base_id: String,
    #[serde(rename = "tableName", default)]
    pub table_name: String,
}

impl AirtableConfig {
    /// Parse and validate the `config` member of a request
    pub fn from_request(config: Option<&Value>) -> Result<Self> {
        let value = match config {
            Some(value) if !value.is_null() => value,
            _ => anyhow::bail!("Airtable configuration is missing"),
        };

        let config: AirtableConfig = serde_json::from_value(value.clone())
            .context("Airtable configuration is malformed")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("Airtable API key is required");
        }
        if self.base_id.trim().is_empty() {
            anyhow::bail!("Airtable base ID is required");
        }
        if self.table_name.trim().is_empty() {
            anyhow::bail!("Airtable table name is required");
        }
        Ok(())
    }
}
