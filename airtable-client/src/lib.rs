pub mod config;
pub mod mapping;
pub mod response;

#[cfg(feature = "client")]
pub mod client;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

// Re-export commonly used items
pub use config::AirtableConfig;
pub use response::ServiceResponse;

#[cfg(feature = "client")]
pub use client::{AirtableClient, DEFAULT_API_URL};

/// Remote-storage operations the background worker delegates to.
///
/// Arguments are the raw `data`, `config` and `fieldMappings` members of the
/// panel's request, passed through untouched. An `Err` is reported back to the
/// panel as `{ success: false, error: <message> }`.
///
/// Futures are `?Send`: the extension runs on the browser's single-threaded
/// event loop and holds `JsValue`s across awaits.
#[async_trait(?Send)]
pub trait AirtableService {
    /// Create a record from scraped profile data
    async fn save_to_airtable(
        &self,
        data: Option<Value>,
        config: Option<Value>,
        field_mappings: Option<Value>,
    ) -> Result<ServiceResponse>;

    /// Check that the token can read the configured table
    async fn test_airtable_connection(&self, config: Option<Value>) -> Result<ServiceResponse>;

    /// Check the mapped field names against the table schema
    async fn test_field_mappings(
        &self,
        data: Option<Value>,
        config: Option<Value>,
        field_mappings: Option<Value>,
    ) -> Result<ServiceResponse>;
}
