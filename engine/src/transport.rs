//! The network side of an execution.
//!
//! `Transport` receives a fully materialized `OutboundRequest` and returns the
//! buffered response. `ReqwestTransport` is the production implementation;
//! anything else (tests, recorders) can be injected into the executor.

use crate::body::{FormPart, RequestBody, OCTET_STREAM};
use crate::config::EngineConfig;
use crate::error::ExecuteError;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use tracing::debug;
use url::Url;

#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

/// Buffered response as received from the target.
///
/// `headers` keeps every value in arrival order, repeated names included.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, ExecuteError>;
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &EngineConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, ExecuteError> {
        let OutboundRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut request_builder = self.client.request(method, url);

        if !body.is_empty() {
            request_builder = match body {
                RequestBody::Text(text) => request_builder.body(text),
                RequestBody::Binary(bytes) => request_builder.body(bytes),
                // Sets the boundary Content-Type; `headers` never carries one for multipart.
                RequestBody::Multipart(parts) => request_builder.multipart(build_form(parts)?),
            };
        }

        let resp = request_builder
            .headers(headers)
            .send()
            .await
            .map_err(|e| ExecuteError::Send(Box::new(e)))?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = resp
            .bytes()
            .await
            .map_err(|e| ExecuteError::ReadBody(Box::new(e)))?
            .to_vec();

        debug!("Received {} bytes with status {}", body.len(), status);

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

fn build_form(parts: Vec<FormPart>) -> Result<Form, ExecuteError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File {
                name,
                file_name,
                content,
            } => {
                let file = Part::bytes(content)
                    .file_name(file_name)
                    .mime_str(OCTET_STREAM)
                    .map_err(|e| ExecuteError::Build(Box::new(e)))?;
                form.part(name, file)
            }
        };
    }
    Ok(form)
}
