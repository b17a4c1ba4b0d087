use axum::http::{HeaderName, HeaderValue};
use axum::response::Response;

const ALLOW_PRIVATE_NETWORK: &str = "access-control-allow-private-network";

/// Adds permissive CORS headers to every response.
///
/// `Access-Control-Allow-Private-Network` lets pages on a public origin reach
/// this agent on localhost.
pub async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, GET, OPTIONS"),
    );
    headers.insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(
        HeaderName::from_static(ALLOW_PRIVATE_NETWORK),
        HeaderValue::from_static("true"),
    );
    response
}
