//! Static file serving for /resources/
//!
//! Serves uploaded images (and anything else placed in the resources
//! directory) back to clients.
//!
//! Example:
//! ```bash
//! curl -O "http://127.0.0.1:8080/resources/images/5f0c...e1.png"
//! ```

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeDir;

use crate::http::server::AppState;
use crate::uploads::RESOURCES_MOUNT;

/// Create router for static file serving from the resources directory
pub fn router(resources_dir: &Path) -> Router<Arc<AppState>> {
    tracing::info!(path = %resources_dir.display(), "Serving static files from {}/", RESOURCES_MOUNT);

    Router::new().nest_service(RESOURCES_MOUNT, ServeDir::new(resources_dir))
}
