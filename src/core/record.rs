use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// An identifier as it appears on the wire: the remote feed uses numbers,
/// older saves may hold strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

/// The flat shape shared by the remote feed and local storage.
///
/// Fields are mapped by name. Unknown fields are ignored; missing optional
/// fields default (`null` is treated the same as missing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: RawId,
    pub category: i64,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub checked: Option<bool>,
}

/// Decode a JSON document holding either an array of records or a single record.
///
/// The document itself must be well-formed. Individual entries that do not
/// fit the record shape are skipped with a warning.
pub fn decode_records(json: &str) -> Result<Vec<TaskRecord>> {
    let entries = match serde_json::from_str::<Value>(json)? {
        Value::Array(entries) => entries,
        obj @ Value::Object(_) => vec![obj],
        other => {
            return Err(Error::InvalidRecord(format!(
                "expected an array of tasks, got {}",
                kind_of(&other)
            )));
        }
    };

    let mut records = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<TaskRecord>(entry) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("Skipping task entry {}: {}", i, e),
        }
    }
    Ok(records)
}

pub fn encode_records(records: &[TaskRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
