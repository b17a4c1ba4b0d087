use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Loosely-typed auth parameters as sent by the caller.
pub type AuthData = HashMap<String, serde_json::Value>;

/// Declarative description of the request the caller wants executed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestDescriptor {
    #[serde(deserialize_with = "deserialize_null_default")]
    pub method: String,
    #[serde(deserialize_with = "deserialize_null_default")]
    pub url: String,
    #[serde(deserialize_with = "deserialize_null_default")]
    pub headers: HashMap<String, String>,
    #[serde(deserialize_with = "deserialize_null_default")]
    pub body: String,
    #[serde(deserialize_with = "deserialize_null_default")]
    pub auth_type: String,
    #[serde(deserialize_with = "deserialize_null_default")]
    pub auth_data: AuthData,
    #[serde(deserialize_with = "deserialize_null_default")]
    pub form_data: Vec<FormField>,
}

/// One entry of a multi-part form. Non-string values are treated as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormField {
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub key: String,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub value: String,
    #[serde(rename = "type", deserialize_with = "deserialize_lenient_string")]
    pub field_type: String,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub file_name: String,
}

impl FormField {
    pub fn is_file(&self) -> bool {
        self.field_type == "file"
    }
}

/// Normalized outcome of one execution, identical in shape for success and failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    pub status: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub duration: u64,
}

impl ResponseDescriptor {
    pub const ERROR_STATUS_TEXT: &'static str = "Error";

    /// A local failure folded into the regular response shape.
    pub fn failure(message: &str, detail: impl std::fmt::Display) -> Self {
        Self {
            status: 0,
            status_text: Self::ERROR_STATUS_TEXT.to_string(),
            headers: HashMap::new(),
            body: format!("{}: {}", message, detail),
            duration: 0,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == 0
    }
}

fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}
