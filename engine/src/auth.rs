//! Authentication schemes and header resolution.
//!
//! `AuthScheme` is the typed form of the caller's `authType` + `authData`
//! pair. Parsing never fails: a scheme whose required fields are missing or
//! not strings collapses to `AuthScheme::None`, so incomplete auth data is
//! silently ignored.

use crate::models::AuthData;
use base64::{engine::general_purpose, Engine};
use std::collections::HashMap;

const AUTHORIZATION: &str = "Authorization";
const DEFAULT_TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    None,
    Basic { username: String, password: String },
    Bearer { token: String },
    OAuth2 { access_token: String, token_type: String },
    ApiKey { key: String, value: String, placement: ApiKeyPlacement },
}

/// Where an API key is attached to the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyPlacement {
    Header,
    Query,
}

impl AuthScheme {
    pub fn from_parts(auth_type: &str, data: &AuthData) -> Self {
        let field = |name: &str| data.get(name).and_then(|v| v.as_str());

        match auth_type {
            "basic" => match (field("username"), field("password")) {
                (Some(username), Some(password)) => AuthScheme::Basic {
                    username: username.to_string(),
                    password: password.to_string(),
                },
                _ => AuthScheme::None,
            },
            "bearer" => match field("token") {
                Some(token) => AuthScheme::Bearer {
                    token: token.to_string(),
                },
                None => AuthScheme::None,
            },
            "oauth2" => match field("accessToken") {
                Some(access_token) => AuthScheme::OAuth2 {
                    access_token: access_token.to_string(),
                    token_type: field("tokenType")
                        .filter(|t| !t.is_empty())
                        .unwrap_or(DEFAULT_TOKEN_TYPE)
                        .to_string(),
                },
                None => AuthScheme::None,
            },
            "api-key" => {
                let placement = match field("addTo").unwrap_or_default() {
                    "" | "header" => ApiKeyPlacement::Header,
                    "query" => ApiKeyPlacement::Query,
                    _ => return AuthScheme::None,
                };
                match (field("key"), field("value")) {
                    (Some(key), Some(value)) => AuthScheme::ApiKey {
                        key: key.to_string(),
                        value: value.to_string(),
                        placement,
                    },
                    _ => AuthScheme::None,
                }
            }
            _ => AuthScheme::None,
        }
    }

    /// The header this scheme contributes, if any.
    pub fn header(&self) -> Option<(String, String)> {
        match self {
            AuthScheme::None => None,
            AuthScheme::Basic { username, password } => {
                let credentials =
                    general_purpose::STANDARD.encode(format!("{}:{}", username, password));
                Some((AUTHORIZATION.to_string(), format!("Basic {}", credentials)))
            }
            AuthScheme::Bearer { token } => {
                Some((AUTHORIZATION.to_string(), format!("Bearer {}", token)))
            }
            AuthScheme::OAuth2 {
                access_token,
                token_type,
            } => Some((
                AUTHORIZATION.to_string(),
                format!("{} {}", token_type, access_token),
            )),
            AuthScheme::ApiKey {
                key,
                value,
                placement: ApiKeyPlacement::Header,
            } => Some((key.clone(), value.clone())),
            AuthScheme::ApiKey { .. } => None,
        }
    }

    /// The query parameter this scheme appends to the URL, if any.
    pub fn query_pair(&self) -> Option<(&str, &str)> {
        match self {
            AuthScheme::ApiKey {
                key,
                value,
                placement: ApiKeyPlacement::Query,
            } => Some((key, value)),
            _ => None,
        }
    }
}

/// Applies `scheme` on top of the caller's baseline headers.
///
/// A header set by the scheme replaces any baseline header of the same name,
/// compared case-insensitively.
pub fn resolve_headers(
    baseline: &HashMap<String, String>,
    scheme: &AuthScheme,
) -> HashMap<String, String> {
    let mut headers = baseline.clone();

    if let Some((name, value)) = scheme.header() {
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        headers.insert(name, value);
    }

    headers
}

/// `resolve_headers` straight from the wire representation.
pub fn resolve(
    baseline: &HashMap<String, String>,
    auth_type: &str,
    auth_data: &AuthData,
) -> HashMap<String, String> {
    resolve_headers(baseline, &AuthScheme::from_parts(auth_type, auth_data))
}
