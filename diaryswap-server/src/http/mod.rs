//! HTTP server layer
//!
//! Axum server with:
//! - CORS (configured origins with credentials, or permissive)
//! - Request tracing
//! - Upload body limit
//! - Graceful shutdown
//! - JSON error responses

pub mod server;
pub mod error;
pub mod extractors;
pub mod routes;

pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
pub use error::ApiError;
