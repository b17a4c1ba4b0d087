//! HTTP surface of the local relay agent.
//!
//! Three endpoints (`/`, `/health`, `/execute`), all CORS-permissive. The
//! actual request handling lives in `relay_engine`.

pub mod config;
pub mod cors;
pub mod logging;
pub mod routes;

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, post};
use axum::{middleware, Router};
use relay_engine::Executor;
use std::sync::Arc;

pub const AGENT_NAME: &str = "Local Relay Agent";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
    pub executor: Executor,
    pub public_url: String,
}

pub fn app(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", any(routes::root_handler))
        .route("/health", any(routes::health_handler))
        .route(
            "/execute",
            post(routes::execute_handler)
                .options(routes::preflight_handler)
                .fallback(routes::method_not_allowed)
                // Descriptors carry base64 file contents; no size cap.
                .layer(DefaultBodyLimit::disable()),
        )
        .fallback(routes::root_handler)
        .layer(middleware::map_response(cors::add_cors_headers))
        .with_state(app_state)
}
