//! Request materialization and execution for the local relay agent.
//!
//! A caller describes an HTTP request as data (`RequestDescriptor`). The
//! engine resolves authentication into headers or query parameters, picks a
//! body encoding, sends the request through a `Transport` and folds the
//! outcome, success or failure, into a `ResponseDescriptor`.

pub mod auth;
pub mod body;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod transport;

pub use auth::{resolve, resolve_headers, ApiKeyPlacement, AuthScheme};
pub use body::{BodyEncoding, FormPart, RequestBody};
pub use config::EngineConfig;
pub use error::ExecuteError;
pub use executor::{prepare, Executor};
pub use models::{AuthData, FormField, RequestDescriptor, ResponseDescriptor};
pub use transport::{OutboundRequest, ReqwestTransport, Transport, TransportResponse};
