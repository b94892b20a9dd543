//! Image upload endpoint

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Multipart field carrying the image
const FILE_FIELD: &str = "file";

/// Upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /upload/image - store an image, return its public URL
///
/// Only the first `file` field is stored; other fields are skipped.
async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await?;
        let stored = state.images.save(file_name.as_deref(), &bytes).await?;

        return Ok(Json(UploadResponse { url: stored.url }));
    }

    Err(ApiError::BadRequest {
        message: format!("multipart field '{}' is required", FILE_FIELD),
    })
}

/// Upload routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/upload/image", post(upload_image))
}
