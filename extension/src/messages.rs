// Messages exchanged with the side panel over chrome.runtime messaging

use serde::Deserialize;
use serde_json::Value;

pub use airtable_client::ServiceResponse as Response;

/// Request sent by the side panel, tagged by its `action` field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    SaveToAirtable {
        data: Option<Value>,
        config: Option<Value>,
        #[serde(rename = "fieldMappings")]
        field_mappings: Option<Value>,
    },
    TestAirtableConnection {
        config: Option<Value>,
    },
    TestFieldMappings {
        data: Option<Value>,
        config: Option<Value>,
        #[serde(rename = "fieldMappings")]
        field_mappings: Option<Value>,
    },
    #[serde(other)]
    Unknown,
}

impl Request {
    /// Decode a raw message. Anything that is not a recognisable request
    /// (no `action`, not an object, `undefined`) becomes [`Request::Unknown`]
    /// so it still gets a reply.
    pub fn from_value(value: Value) -> Self {
        // serde would also accept a variant index as the tag
        if !value.get("action").is_some_and(Value::is_string) {
            log::debug!("Message without a string action treated as unknown action");
            return Request::Unknown;
        }

        match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                log::debug!("Undecodable message treated as unknown action: {}", e);
                Request::Unknown
            }
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Request::SaveToAirtable { .. } => "saveToAirtable",
            Request::TestAirtableConnection { .. } => "testAirtableConnection",
            Request::TestFieldMappings { .. } => "testFieldMappings",
            Request::Unknown => "unknown",
        }
    }
}

/// `details` of `chrome.runtime.onInstalled`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallDetails {
    pub reason: String,
    #[serde(default)]
    pub previous_version: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// The subset of `tabs.Tab` the action click handler reads
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub window_id: Option<i32>,
}
