use crate::auth::{resolve_headers, AuthScheme};
use crate::body::{content_type, sorted_headers, RequestBody};
use crate::config::EngineConfig;
use crate::error::{describe, ExecuteError};
use crate::models::{RequestDescriptor, ResponseDescriptor};
use crate::transport::{OutboundRequest, ReqwestTransport, Transport, TransportResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use url::Url;

/// Headers never copied from the caller; the HTTP client manages them itself.
/// Accept-Encoding in particular would ask for a compressed body the client
/// then would not decode.
const CLIENT_MANAGED_HEADERS: &[&str] = &["accept-encoding", "content-length", "host"];

/// Materializes request descriptors and runs them through a `Transport`.
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
}

impl Executor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Executor backed by a `reqwest` client built from `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(Arc::new(ReqwestTransport::new(config)?)))
    }

    /// Runs `descriptor` and always returns a response; failures have status 0.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> ResponseDescriptor {
        let request = match prepare(descriptor) {
            Ok(request) => request,
            Err(e) => return failure(e),
        };

        let start = Instant::now();
        let result = self.transport.send(request).await;
        let duration = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                info!("Target answered {} in {}ms", response.status, duration);
                normalize(response, duration)
            }
            Err(e) => failure(e),
        }
    }
}

/// Turns a descriptor into the literal outbound request.
pub fn prepare(descriptor: &RequestDescriptor) -> Result<OutboundRequest, ExecuteError> {
    let scheme = AuthScheme::from_parts(&descriptor.auth_type, &descriptor.auth_data);
    let resolved = resolve_headers(&descriptor.headers, &scheme);
    let body = RequestBody::build(descriptor, &resolved);

    let method = parse_method(&descriptor.method)?;

    let mut url = Url::parse(&descriptor.url).map_err(|source| ExecuteError::InvalidUrl {
        url: descriptor.url.clone(),
        source,
    })?;
    if let Some((key, value)) = scheme.query_pair() {
        url.query_pairs_mut().append_pair(key, value);
    }

    let headers = outbound_headers(&resolved, &body)?;

    Ok(OutboundRequest {
        method,
        url,
        headers,
        body,
    })
}

fn parse_method(method: &str) -> Result<Method, ExecuteError> {
    if method.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(method.as_bytes()).map_err(|_| ExecuteError::InvalidMethod(method.to_string()))
}

/// Copies the resolved headers onto a `HeaderMap`.
///
/// Headers are applied in `sorted_headers` order, so of two names differing
/// only in case the last one in that order wins. Content-Type goes in after
/// every other header. A multipart body supplies its own boundary content
/// type, so the declared one is dropped there.
fn outbound_headers(
    resolved: &HashMap<String, String>,
    body: &RequestBody,
) -> Result<HeaderMap, ExecuteError> {
    let mut headers = HeaderMap::new();

    for (name, value) in sorted_headers(resolved) {
        if name.eq_ignore_ascii_case(CONTENT_TYPE.as_str())
            || CLIENT_MANAGED_HEADERS
                .iter()
                .any(|managed| name.eq_ignore_ascii_case(managed))
        {
            continue;
        }
        let (name, value) = header_pair(name, value)?;
        headers.insert(name, value);
    }

    if !body.overrides_content_type() {
        if let Some(declared) = content_type(resolved) {
            let (name, value) = header_pair(CONTENT_TYPE.as_str(), declared)?;
            headers.insert(name, value);
        }
    }

    Ok(headers)
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ExecuteError> {
    let invalid = || ExecuteError::InvalidHeader {
        name: name.to_string(),
    };
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
    let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
    Ok((header_name, header_value))
}

fn normalize(response: TransportResponse, duration: u64) -> ResponseDescriptor {
    let mut headers = HashMap::new();
    for (name, value) in response.headers {
        headers.entry(canonical_header_name(&name)).or_insert(value);
    }

    ResponseDescriptor {
        status: response.status,
        status_text: status_text(response.status),
        headers,
        body: String::from_utf8_lossy(&response.body).into_owned(),
        duration,
    }
}

fn failure(err: ExecuteError) -> ResponseDescriptor {
    let detail = describe(&err);
    error!("Error: {} - {}", err.context(), detail);
    ResponseDescriptor::failure(err.context(), detail)
}

/// `"201 Created"` style status line built from the canonical reason phrase
/// for `status`, not the phrase the server sent on the wire. Codes without a
/// canonical reason render as the bare number.
fn status_text(status: u16) -> String {
    match StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
    {
        Some(reason) => format!("{} {}", status, reason),
        None => status.to_string(),
    }
}

/// MIME-canonical header name: `x-request-id` becomes `X-Request-Id`.
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::FormPart;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every request and answers with a canned result.
    struct FakeTransport {
        seen: Mutex<Vec<OutboundRequest>>,
        reply: fn() -> Result<TransportResponse, ExecuteError>,
    }

    impl FakeTransport {
        fn new(reply: fn() -> Result<TransportResponse, ExecuteError>) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                reply,
            })
        }

        fn last(&self) -> OutboundRequest {
            self.seen.lock().unwrap().last().cloned().expect("no request sent")
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, ExecuteError> {
            self.seen.lock().unwrap().push(request);
            (self.reply)()
        }
    }

    fn ok_reply() -> Result<TransportResponse, ExecuteError> {
        Ok(TransportResponse {
            status: 201,
            headers: vec![
                ("x-id".to_string(), "42".to_string()),
                ("set-cookie".to_string(), "a=1".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
            ],
            body: br#"{"created":true}"#.to_vec(),
        })
    }

    fn refused_reply() -> Result<TransportResponse, ExecuteError> {
        Err(ExecuteError::Send("connection refused".into()))
    }

    fn broken_body_reply() -> Result<TransportResponse, ExecuteError> {
        Err(ExecuteError::ReadBody("unexpected end of stream".into()))
    }

    fn request(value: serde_json::Value) -> RequestDescriptor {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn success_is_normalized() {
        let transport = FakeTransport::new(ok_reply);
        let executor = Executor::new(transport.clone());

        let response = executor
            .execute(&request(json!({
                "method": "POST",
                "url": "http://localhost:8080/items",
                "headers": {"Content-Type": "application/json"},
                "body": "{\"name\":\"x\"}",
                "authType": "none"
            })))
            .await;

        assert_eq!(response.status, 201);
        assert_eq!(response.status_text, "201 Created");
        assert_eq!(response.headers["X-Id"], "42");
        assert_eq!(response.headers["Set-Cookie"], "a=1");
        assert_eq!(response.body, r#"{"created":true}"#);

        let sent = transport.last();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.headers[CONTENT_TYPE], "application/json");
        assert_eq!(sent.body, RequestBody::Text("{\"name\":\"x\"}".to_string()));
    }

    #[tokio::test]
    async fn transport_failure_becomes_status_zero() {
        let executor = Executor::new(FakeTransport::new(refused_reply));
        let response = executor
            .execute(&request(json!({"method": "GET", "url": "http://localhost:9999/x"})))
            .await;

        assert_eq!(
            response,
            ResponseDescriptor {
                status: 0,
                status_text: "Error".to_string(),
                headers: HashMap::new(),
                body: "Request failed: connection refused".to_string(),
                duration: 0,
            }
        );
    }

    #[tokio::test]
    async fn read_failure_uses_its_own_message() {
        let executor = Executor::new(FakeTransport::new(broken_body_reply));
        let response = executor
            .execute(&request(json!({"method": "GET", "url": "http://localhost:8080/"})))
            .await;

        assert_eq!(response.status, 0);
        assert_eq!(
            response.body,
            "Failed to read response: unexpected end of stream"
        );
    }

    #[tokio::test]
    async fn build_failures_never_reach_the_transport() {
        let transport = FakeTransport::new(ok_reply);
        let executor = Executor::new(transport.clone());

        for bad in [
            json!({"method": "GE T", "url": "http://localhost/"}),
            json!({"method": "GET", "url": "not a url"}),
            json!({"method": "GET", "url": "http://localhost/", "headers": {"Bad Name": "x"}}),
            json!({"method": "GET", "url": "http://localhost/", "headers": {"X-Line": "a\nb"}}),
        ] {
            let response = executor.execute(&request(bad.clone())).await;
            assert_eq!(response.status, 0, "{}", bad);
            assert_eq!(response.status_text, "Error");
            assert!(response.body.starts_with("Request failed: "), "{}", response.body);
        }
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn api_key_query_is_appended_to_existing_params() {
        let sent = prepare(&request(json!({
            "method": "GET",
            "url": "http://localhost:8080/search?q=rust&api_key=old",
            "authType": "api-key",
            "authData": {"key": "api_key", "value": "new", "addTo": "query"}
        })))
        .unwrap();

        assert_eq!(sent.url.query(), Some("q=rust&api_key=old&api_key=new"));
        assert!(sent.headers.get("api_key").is_none());
    }

    #[test]
    fn api_key_header_is_set() {
        let sent = prepare(&request(json!({
            "url": "http://localhost:8080/",
            "authType": "api-key",
            "authData": {"key": "X-Api-Key", "value": "secret"}
        })))
        .unwrap();

        assert_eq!(sent.method, Method::GET);
        assert_eq!(sent.headers["x-api-key"], "secret");
        assert_eq!(sent.url.query(), None);
    }

    #[test]
    fn accept_encoding_is_not_forwarded() {
        let sent = prepare(&request(json!({
            "method": "GET",
            "url": "http://localhost:8080/",
            "headers": {"Accept-Encoding": "gzip, br", "Accept": "text/html"},
            "authType": "bearer",
            "authData": {"token": "T"}
        })))
        .unwrap();

        assert!(sent.headers.get("accept-encoding").is_none());
        assert_eq!(sent.headers["accept"], "text/html");
        assert_eq!(sent.headers["authorization"], "Bearer T");
    }

    #[test]
    fn multipart_boundary_wins_over_declared_content_type() {
        let sent = prepare(&request(json!({
            "method": "POST",
            "url": "http://localhost:8080/upload",
            "headers": {"Content-Type": "application/json"},
            "body": "{}",
            "formData": [
                {"key": "doc", "value": "%%not-base64%%", "type": "file", "fileName": "doc.txt"},
                {"key": "title", "value": "Report"}
            ]
        })))
        .unwrap();

        assert!(sent.headers.get(CONTENT_TYPE).is_none());
        assert_eq!(
            sent.body,
            RequestBody::Multipart(vec![
                FormPart::File {
                    name: "doc".to_string(),
                    file_name: "doc.txt".to_string(),
                    content: b"%%not-base64%%".to_vec(),
                },
                FormPart::Text {
                    name: "title".to_string(),
                    value: "Report".to_string(),
                },
            ])
        );
    }

    #[test]
    fn octet_stream_body_is_sent_as_bytes() {
        let sent = prepare(&request(json!({
            "method": "PUT",
            "url": "http://localhost:8080/blob",
            "headers": {"Content-Type": "application/octet-stream"},
            "body": "AAH/"
        })))
        .unwrap();

        assert_eq!(sent.body, RequestBody::Binary(vec![0x00, 0x01, 0xff]));
        assert_eq!(sent.headers[CONTENT_TYPE], "application/octet-stream");
    }

    #[test]
    fn duplicate_header_names_resolve_the_same_way_every_time() {
        let descriptor = request(json!({
            "method": "PUT",
            "url": "http://localhost:8080/blob",
            "headers": {
                "X-Tenant": "upper",
                "x-tenant": "lower",
                "Content-Type": "application/json",
                "content-type": "application/octet-stream"
            },
            "body": "AAH/"
        }));

        for _ in 0..16 {
            let sent = prepare(&descriptor).unwrap();
            assert_eq!(sent.headers.get_all("x-tenant").iter().count(), 1);
            assert_eq!(sent.headers["x-tenant"], "lower");
            assert_eq!(sent.headers[CONTENT_TYPE], "application/octet-stream");
            assert_eq!(sent.body, RequestBody::Binary(vec![0x00, 0x01, 0xff]));
        }
    }

    #[tokio::test]
    async fn failure_body_carries_the_cause_chain() {
        fn nested_reply() -> Result<TransportResponse, ExecuteError> {
            let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "operation timed out");
            Err(ExecuteError::Send(Box::new(io)))
        }

        let executor = Executor::new(FakeTransport::new(nested_reply));
        let response = executor
            .execute(&request(json!({"method": "GET", "url": "not a url"})))
            .await;
        assert_eq!(
            response.body,
            "Request failed: invalid URL \"not a url\": relative URL without a base"
        );

        let response = executor
            .execute(&request(json!({"method": "GET", "url": "http://localhost:8080/"})))
            .await;
        assert_eq!(response.body, "Request failed: operation timed out");
    }

    #[test]
    fn header_names_are_canonicalized() {
        assert_eq!(canonical_header_name("x-id"), "X-Id");
        assert_eq!(canonical_header_name("content-type"), "Content-Type");
        assert_eq!(canonical_header_name("WWW-AUTHENTICATE"), "Www-Authenticate");
        assert_eq!(canonical_header_name("etag"), "Etag");
    }

    #[test]
    fn status_text_includes_reason() {
        assert_eq!(status_text(200), "200 OK");
        assert_eq!(status_text(404), "404 Not Found");
        assert_eq!(status_text(599), "599");
    }
}
