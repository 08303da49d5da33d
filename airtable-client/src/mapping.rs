// Field mapping between scraped profile data and Airtable columns

use anyhow::Result;
use serde_json::{Map, Value};

/// Build the Airtable `fields` object for a record.
///
/// `mappings` maps data keys to Airtable field names. With no mapping (or an
/// empty one) data keys are used as field names. Blank targets, `null`
/// values and empty strings are dropped.
pub fn map_fields(data: Option<&Value>, mappings: Option<&Value>) -> Result<Map<String, Value>> {
    let data = match data {
        Some(Value::Object(data)) => data,
        Some(Value::Null) | None => anyhow::bail!("Profile data is missing"),
        Some(_) => anyhow::bail!("Profile data must be an object"),
    };

    let mappings = field_mappings(mappings)?;
    let mut fields = Map::new();

    if mappings.is_empty() {
        for (key, value) in data {
            if is_present(value) {
                fields.insert(key.clone(), value.clone());
            }
        }
        return Ok(fields);
    }

    for (source, target) in &mappings {
        if target.is_empty() {
            continue;
        }
        if let Some(value) = data.get(source).filter(|v| is_present(v)) {
            fields.insert(target.clone(), value.clone());
        }
    }

    Ok(fields)
}

/// Airtable field names the mapping writes to
pub fn mapped_field_names(mappings: Option<&Value>) -> Result<Vec<String>> {
    Ok(field_mappings(mappings)?
        .into_iter()
        .map(|(_, target)| target)
        .filter(|target| !target.is_empty())
        .collect())
}

fn field_mappings(mappings: Option<&Value>) -> Result<Vec<(String, String)>> {
    let mappings = match mappings {
        Some(Value::Object(mappings)) => mappings,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(_) => anyhow::bail!("Field mappings must be an object"),
    };

    mappings
        .iter()
        .map(|(source, target)| match target {
            Value::String(target) => Ok((source.clone(), target.trim().to_string())),
            Value::Null => Ok((source.clone(), String::new())),
            _ => anyhow::bail!("Field mapping for '{}' must be a field name", source),
        })
        .collect()
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
