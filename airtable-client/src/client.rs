use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::AirtableConfig;
use crate::mapping::{map_fields, mapped_field_names};
use crate::response::ServiceResponse;
use crate::AirtableService;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com";

/// HTTP implementation of [`AirtableService`] over the Airtable REST API
pub struct AirtableClient {
    api_url: Url,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CreatedRecord {
    id: String,
    #[serde(default)]
    fields: Value,
}

#[derive(Deserialize)]
struct TablesResponse {
    tables: Vec<TableSchema>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TableSchema {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FieldSchema {
    pub name: String,
}

impl AirtableClient {
    pub fn new(api_url: &str) -> Result<Self> {
        let api_url =
            Url::parse(api_url).context(format!("Invalid Airtable API URL: {}", api_url))?;

        Ok(Self {
            api_url,
            client: reqwest::Client::new(),
        })
    }

    /// `{api}/v0/{baseId}/{tableName}`, with the table name percent-encoded
    pub fn table_url(&self, config: &AirtableConfig) -> Result<Url> {
        self.url(&["v0", &config.base_id, &config.table_name])
    }

    /// `{api}/v0/meta/bases/{baseId}/tables`
    pub fn schema_url(&self, config: &AirtableConfig) -> Result<Url> {
        self.url(&["v0", "meta", "bases", &config.base_id, "tables"])
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Airtable API URL cannot be a base: {}", self.api_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let resp = request
            .send()
            .await
            .context("Failed to reach Airtable")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(api_error_message(status, &body));
        }

        Ok(resp)
    }

    /// Fetch the schema of the configured table
    pub async fn table_schema(&self, config: &AirtableConfig) -> Result<TableSchema> {
        let resp = self
            .send(
                self.client
                    .get(self.schema_url(config)?)
                    .bearer_auth(&config.api_key),
            )
            .await?;

        let tables: TablesResponse = resp
            .json()
            .await
            .context("Failed to parse Airtable schema response")?;

        find_table(tables.tables, &config.table_name)
    }
}

#[async_trait(?Send)]
impl AirtableService for AirtableClient {
    async fn save_to_airtable(
        &self,
        data: Option<Value>,
        config: Option<Value>,
        field_mappings: Option<Value>,
    ) -> Result<ServiceResponse> {
        let config = AirtableConfig::from_request(config.as_ref())?;
        let fields = map_fields(data.as_ref(), field_mappings.as_ref())?;
        if fields.is_empty() {
            anyhow::bail!("No fields to save after applying field mappings");
        }

        log::info!(
            "Saving record with {} fields to {}/{}",
            fields.len(),
            config.base_id,
            config.table_name
        );

        let resp = self
            .send(
                self.client
                    .post(self.table_url(&config)?)
                    .bearer_auth(&config.api_key)
                    .json(&json!({ "fields": fields, "typecast": true })),
            )
            .await?;

        let record: CreatedRecord = resp
            .json()
            .await
            .context("Failed to parse Airtable create response")?;

        log::info!("Created Airtable record {}", record.id);

        Ok(ServiceResponse::ok()
            .with("recordId", record.id)
            .with("fields", record.fields))
    }

    async fn test_airtable_connection(&self, config: Option<Value>) -> Result<ServiceResponse> {
        let config = AirtableConfig::from_request(config.as_ref())?;

        let mut url = self.table_url(&config)?;
        url.query_pairs_mut().append_pair("maxRecords", "1");

        self.send(self.client.get(url).bearer_auth(&config.api_key))
            .await?;

        log::info!(
            "Airtable connection OK for {}/{}",
            config.base_id,
            config.table_name
        );

        Ok(ServiceResponse::ok().with("message", "Connection successful"))
    }

    async fn test_field_mappings(
        &self,
        data: Option<Value>,
        config: Option<Value>,
        field_mappings: Option<Value>,
    ) -> Result<ServiceResponse> {
        let config = AirtableConfig::from_request(config.as_ref())?;

        // Profile data is optional here; the panel may test mappings before scraping.
        let preview = match data.as_ref() {
            Some(Value::Object(_)) => Some(map_fields(data.as_ref(), field_mappings.as_ref())?),
            _ => None,
        };

        let table = self.table_schema(&config).await?;
        let mut mapped = mapped_field_names(field_mappings.as_ref())?;
        // Without a mapping, save uses the data keys as field names
        if mapped.is_empty() {
            if let Some(preview) = &preview {
                mapped = preview.keys().cloned().collect();
            }
        }
        let mut response = check_mapped_fields(&table, &mapped);

        if let Some(preview) = preview {
            response = response.with("preview", Value::Object(preview));
        }
        Ok(response)
    }
}

/// Error text for a failed Airtable call: `"<code> <reason>"`, plus the
/// message from Airtable's error body when there is one
pub fn api_error_message(status: StatusCode, body: &str) -> String {
    let mut message = match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    };

    if let Some(detail) = error_detail(body) {
        message.push_str(": ");
        message.push_str(&detail);
    }
    message
}

// Airtable answers `{"error": {"type": "...", "message": "..."}}` or `{"error": "NOT_FOUND"}`
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        Value::String(kind) => Some(kind.clone()),
        error => error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| error.get("type").and_then(Value::as_str))
            .map(str::to_string),
    }
}

/// Pick the configured table out of a base schema, by name or id
pub fn find_table(tables: Vec<TableSchema>, table: &str) -> Result<TableSchema> {
    tables
        .into_iter()
        .find(|t| t.name == table || t.id == table)
        .ok_or_else(|| anyhow::anyhow!("Table \"{}\" not found in base", table))
}

/// Compare mapped field names against the table schema
pub fn check_mapped_fields(table: &TableSchema, mapped: &[String]) -> ServiceResponse {
    let (found, missing): (Vec<&String>, Vec<&String>) = mapped
        .iter()
        .partition(|name| table.fields.iter().any(|f| &f.name == *name));

    let response = if missing.is_empty() {
        ServiceResponse::ok()
    } else {
        let names: Vec<&str> = missing.iter().map(|s| s.as_str()).collect();
        ServiceResponse::failure(format!("Fields not found in table: {}", names.join(", ")))
    };

    response
        .with("mappedFields", json!(found))
        .with("missingFields", json!(missing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config(table: &str) -> AirtableConfig {
        AirtableConfig {
            api_key: "pat".to_string(),
            base_id: "appXYZ".to_string(),
            table_name: table.to_string(),
        }
    }

    fn table() -> TableSchema {
        TableSchema {
            id: "tbl1".to_string(),
            name: "Contacts".to_string(),
            fields: vec![
                FieldSchema {
                    name: "Full Name".to_string(),
                },
                FieldSchema {
                    name: "Title".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_table_url_encodes_name() {
        let client = AirtableClient::new(DEFAULT_API_URL).unwrap();
        let url = client.table_url(&config("LinkedIn Leads")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.airtable.com/v0/appXYZ/LinkedIn%20Leads"
        );
    }

    #[test]
    fn test_schema_url_with_trailing_slash() {
        let client = AirtableClient::new("http://localhost:8080/").unwrap();
        let url = client.schema_url(&config("Contacts")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/v0/meta/bases/appXYZ/tables"
        );
    }

    #[test]
    fn test_invalid_api_url() {
        assert!(AirtableClient::new("not a url").is_err());
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error_message(StatusCode::UNAUTHORIZED, ""),
            "401 Unauthorized"
        );
        assert_eq!(
            api_error_message(
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"error":{"type":"UNKNOWN_FIELD_NAME","message":"Unknown field name: \"Nme\""}}"#
            ),
            "422 Unprocessable Entity: Unknown field name: \"Nme\""
        );
        assert_eq!(
            api_error_message(StatusCode::NOT_FOUND, r#"{"error":"NOT_FOUND"}"#),
            "404 Not Found: NOT_FOUND"
        );
    }

    #[test]
    fn test_find_table_by_name_or_id() {
        assert_eq!(find_table(vec![table()], "Contacts").unwrap().id, "tbl1");
        assert_eq!(find_table(vec![table()], "tbl1").unwrap().name, "Contacts");

        let err = find_table(vec![table()], "Leads").unwrap_err();
        assert_eq!(err.to_string(), "Table \"Leads\" not found in base");
    }

    #[test]
    fn test_check_mapped_fields() {
        let ok = check_mapped_fields(&table(), &["Full Name".to_string()]);
        assert!(ok.success);
        assert_eq!(ok.field("mappedFields"), Some(&json!(["Full Name"])));
        assert_eq!(ok.field("missingFields"), Some(&json!([])));

        let missing = check_mapped_fields(
            &table(),
            &["Email".to_string(), "Title".to_string(), "Phone".to_string()],
        );
        assert!(!missing.success);
        assert_eq!(
            missing.error.as_deref(),
            Some("Fields not found in table: Email, Phone")
        );
        assert_eq!(missing.field("mappedFields"), Some(&json!(["Title"])));
    }

    #[test]
    fn test_rejects_before_any_request() {
        let client = AirtableClient::new(DEFAULT_API_URL).unwrap();

        let err = futures::executor::block_on(client.test_airtable_connection(None)).unwrap_err();
        assert_eq!(err.to_string(), "Airtable configuration is missing");

        let err = futures::executor::block_on(client.save_to_airtable(
            Some(json!({ "name": "" })),
            Some(json!({ "apiKey": "pat", "baseId": "app", "tableName": "T" })),
            None,
        ))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No fields to save after applying field mappings"
        );
    }

    fn request_config() -> Value {
        json!({ "apiKey": "pat", "baseId": "appXYZ", "tableName": "Contacts" })
    }

    const SCHEMA: &str = r#"{"tables":[{"id":"tbl1","name":"Contacts","fields":[
        {"id":"fld1","name":"Full Name","type":"singleLineText"},
        {"id":"fld2","name":"Title","type":"singleLineText"}]}]}"#;

    #[tokio::test]
    async fn test_save_posts_mapped_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v0/appXYZ/Contacts")
            .match_header("authorization", "Bearer pat")
            .match_body(Matcher::Json(json!({
                "fields": { "Full Name": "Ada", "Title": "Engineer" },
                "typecast": true
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"rec123","createdTime":"2024-01-01T00:00:00.000Z","fields":{"Full Name":"Ada","Title":"Engineer"}}"#)
            .create_async()
            .await;

        let client = AirtableClient::new(&server.url()).unwrap();
        let response = client
            .save_to_airtable(
                Some(json!({ "name": "Ada", "headline": "Engineer", "location": "" })),
                Some(request_config()),
                Some(json!({ "name": "Full Name", "headline": "Title" })),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "success": true,
                "recordId": "rec123",
                "fields": { "Full Name": "Ada", "Title": "Engineer" }
            })
        );
    }

    #[tokio::test]
    async fn test_save_reports_airtable_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v0/appXYZ/Contacts")
            .with_status(422)
            .with_body(r#"{"error":{"type":"UNKNOWN_FIELD_NAME","message":"Unknown field name: \"name\""}}"#)
            .create_async()
            .await;

        let client = AirtableClient::new(&server.url()).unwrap();
        let err = client
            .save_to_airtable(Some(json!({ "name": "Ada" })), Some(request_config()), None)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "422 Unprocessable Entity: Unknown field name: \"name\""
        );
    }

    #[tokio::test]
    async fn test_connection_reads_one_record() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v0/appXYZ/Contacts")
            .match_query(Matcher::UrlEncoded("maxRecords".into(), "1".into()))
            .match_header("authorization", "Bearer pat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"records":[]}"#)
            .create_async()
            .await;

        let client = AirtableClient::new(&server.url()).unwrap();
        let response = client
            .test_airtable_connection(Some(request_config()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.success);
        assert_eq!(
            response.field("message"),
            Some(&json!("Connection successful"))
        );
    }

    #[tokio::test]
    async fn test_connection_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v0/appXYZ/Contacts")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error":{"type":"AUTHENTICATION_REQUIRED","message":"Authentication required"}}"#)
            .create_async()
            .await;

        let client = AirtableClient::new(&server.url()).unwrap();
        let err = client
            .test_airtable_connection(Some(request_config()))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "401 Unauthorized: Authentication required");
    }

    #[tokio::test]
    async fn test_field_mappings_against_schema() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v0/meta/bases/appXYZ/tables")
            .match_header("authorization", "Bearer pat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SCHEMA)
            .create_async()
            .await;

        let client = AirtableClient::new(&server.url()).unwrap();
        let response = client
            .test_field_mappings(
                Some(json!({ "name": "Ada", "email": "ada@example.com" })),
                Some(request_config()),
                Some(json!({ "name": "Full Name", "email": "Email" })),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "success": false,
                "error": "Fields not found in table: Email",
                "mappedFields": ["Full Name"],
                "missingFields": ["Email"],
                "preview": { "Full Name": "Ada", "Email": "ada@example.com" }
            })
        );
    }

    #[tokio::test]
    async fn test_field_mappings_without_mapping_checks_data_keys() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v0/meta/bases/appXYZ/tables")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SCHEMA)
            .create_async()
            .await;

        let client = AirtableClient::new(&server.url()).unwrap();
        let response = client
            .test_field_mappings(
                Some(json!({ "Title": "Engineer", "name": "Ada", "headline": "" })),
                Some(request_config()),
                Some(json!({})),
            )
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("Fields not found in table: name")
        );
        assert_eq!(response.field("mappedFields"), Some(&json!(["Title"])));
        assert_eq!(response.field("missingFields"), Some(&json!(["name"])));
    }

    #[tokio::test]
    async fn test_field_mappings_unknown_table() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v0/meta/bases/appXYZ/tables")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SCHEMA)
            .create_async()
            .await;

        let client = AirtableClient::new(&server.url()).unwrap();
        let err = client
            .test_field_mappings(
                None,
                Some(json!({ "apiKey": "pat", "baseId": "appXYZ", "tableName": "Leads" })),
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Table \"Leads\" not found in base");
    }
}
