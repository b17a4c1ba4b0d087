use crate::{AppState, AGENT_NAME, VERSION};
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use relay_engine::{RequestDescriptor, ResponseDescriptor};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub agent: &'static str,
    pub version: &'static str,
}

/// Landing page; also answers every path without a route of its own.
pub async fn root_handler(method: Method, State(app_state): State<Arc<AppState>>) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        banner_text(&app_state.public_url),
    )
        .into_response()
}

pub async fn health_handler(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    Json(Health {
        status: "ok",
        agent: AGENT_NAME,
        version: VERSION,
    })
    .into_response()
}

pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
}

/// Runs one request descriptor. Answers 400 only for an unparsable payload;
/// outbound failures come back as a 200 with status 0 in the body.
#[axum::debug_handler]
pub async fn execute_handler(State(app_state): State<Arc<AppState>>, body: bytes::Bytes) -> Response {
    let descriptor: RequestDescriptor = match serde_json::from_slice(&body) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            error!("Invalid request payload: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid request payload").into_response();
        }
    };

    let request_id = Uuid::new_v4();
    let span = info_span!("execute", %request_id);

    let response: ResponseDescriptor = async {
        info!(
            "Executing request: {} {} (Auth: {})",
            descriptor.method, descriptor.url, descriptor.auth_type
        );
        let response = app_state.executor.execute(&descriptor).await;
        if !response.is_failure() {
            info!(
                "Request completed: {} ({}ms)",
                response.status_text, response.duration
            );
        }
        response
    }
    .instrument(span)
    .await;

    Json(response).into_response()
}

fn banner_text(public_url: &str) -> String {
    format!(
        "{name} - ONLINE

Version: {version}
Status:  Running on {url}

This agent lets web pages send requests to localhost and private network APIs,
bypassing browser CORS restrictions.

Available Endpoints:
  GET  /health  - Health check
  POST /execute - Execute HTTP request
",
        name = AGENT_NAME,
        version = VERSION,
        url = public_url,
    )
}
