//! Outbound body encoding.
//!
//! The encoding is picked by `BodyEncoding::select`, evaluated top to bottom:
//!
//! | form fields | body      | Content-Type             | encoding    |
//! |-------------|-----------|--------------------------|-------------|
//! | non-empty   | any       | any                      | `Multipart` |
//! | empty       | non-empty | has octet-stream         | `Binary`    |
//! | empty       | any       | any                      | `Text`      |
//!
//! A multipart body always carries its own boundary content type, which wins
//! over whatever `Content-Type` the caller declared.

use crate::models::{FormField, RequestDescriptor};
use base64::{engine::general_purpose, Engine};
use std::collections::HashMap;
use tracing::debug;

pub const OCTET_STREAM: &str = "application/octet-stream";
const DEFAULT_FILE_NAME: &str = "file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Multipart,
    Binary,
    Text,
}

impl BodyEncoding {
    pub fn select(has_form_fields: bool, has_body: bool, content_type: Option<&str>) -> Self {
        let octet_stream = content_type.is_some_and(|ct| ct.contains(OCTET_STREAM));
        match (has_form_fields, has_body, octet_stream) {
            (true, _, _) => BodyEncoding::Multipart,
            (false, true, true) => BodyEncoding::Binary,
            (false, _, _) => BodyEncoding::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content: Vec<u8>,
    },
}

/// Fully materialized request body, independent of the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Text(String),
    Binary(Vec<u8>),
    Multipart(Vec<FormPart>),
}

impl RequestBody {
    /// Builds the body for `descriptor` given its resolved headers.
    pub fn build(descriptor: &RequestDescriptor, headers: &HashMap<String, String>) -> Self {
        let encoding = BodyEncoding::select(
            !descriptor.form_data.is_empty(),
            !descriptor.body.is_empty(),
            content_type(headers),
        );

        match encoding {
            BodyEncoding::Multipart => RequestBody::Multipart(
                descriptor.form_data.iter().filter_map(form_part).collect(),
            ),
            BodyEncoding::Binary => RequestBody::Binary(decode_or_literal(&descriptor.body)),
            BodyEncoding::Text => RequestBody::Text(descriptor.body.clone()),
        }
    }

    /// Whether the body dictates its own Content-Type.
    pub fn overrides_content_type(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Text(text) => text.is_empty(),
            RequestBody::Binary(bytes) => bytes.is_empty(),
            RequestBody::Multipart(_) => false,
        }
    }
}

/// Caller headers ordered by name (byte order), the order they are applied in.
pub fn sorted_headers(headers: &HashMap<String, String>) -> Vec<(&str, &str)> {
    let mut sorted: Vec<(&str, &str)> = headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));
    sorted
}

/// Looks up the declared Content-Type, ignoring header name case.
///
/// When several spellings are present the last one in `sorted_headers`
/// order wins, matching how the outbound headers are applied.
pub fn content_type(headers: &HashMap<String, String>) -> Option<&str> {
    sorted_headers(headers)
        .into_iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .last()
        .map(|(_, value)| value)
}

fn form_part(field: &FormField) -> Option<FormPart> {
    if field.key.is_empty() {
        return None;
    }

    if field.is_file() {
        let file_name = if field.file_name.is_empty() {
            DEFAULT_FILE_NAME.to_string()
        } else {
            field.file_name.clone()
        };
        Some(FormPart::File {
            name: field.key.clone(),
            file_name,
            content: decode_or_literal(&field.value),
        })
    } else {
        Some(FormPart::Text {
            name: field.key.clone(),
            value: field.value.clone(),
        })
    }
}

/// Base64-decodes `value`, falling back to its literal bytes.
fn decode_or_literal(value: &str) -> Vec<u8> {
    match general_purpose::STANDARD.decode(value) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!("Value is not valid base64 ({}), sending it verbatim", e);
            value.as_bytes().to_vec()
        }
    }
}
