use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use common::storage::{ObjectPath, StorageError};
use tracing::instrument;

use crate::error::AppError;
use crate::pipeline::AssetClass;
use crate::state::AppState;

/// Serve stored bytes so `public_url` resolves when blobs live on local disk.
///
/// Object paths are never reused, so responses are cacheable indefinitely.
#[instrument(skip(state))]
pub async fn serve_media(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let class = AssetClass::from_bucket(&bucket)
        .ok_or_else(|| AppError::NotFound(format!("Bucket '{bucket}' not found")))?;
    let path = ObjectPath::parse(&path)
        .map_err(|_| AppError::NotFound("Media not found".to_string()))?;

    let pipeline = state.pipeline(class);
    let content = pipeline
        .blob_store()
        .get(&path)
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => AppError::NotFound("Media not found".to_string()),
            other => AppError::Storage(other.to_string()),
        })?;

    let mime = path
        .extension()
        .map(|ext| mime_guess::from_ext(ext).first_or_octet_stream())
        .unwrap_or(mime_guess::mime::APPLICATION_OCTET_STREAM);

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CONTENT_LENGTH, content.len().to_string())
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(e.to_string()))
}
