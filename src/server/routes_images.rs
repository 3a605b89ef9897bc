//! Image management API routes.
//!
//! All routes address an image by its storage-root-relative path:
//!
//! - `PUT /api/images/{*path}` stores the request body as a new image
//! - `GET /api/images/{*path}` reports whether the image exists
//! - `DELETE /api/images/{*path}` is not supported and answers 501

use std::path::Path as FsPath;

use axum::{
    body::Body,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::StreamExt;
use pixelstore_common::Error;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use super::error::AppError;
use super::AppContext;
use crate::storage::{ImageStorage, UploadedImage};

/// Create image-related routes.
pub fn image_routes() -> Router<AppContext> {
    Router::new().route(
        "/images/*path",
        get(image_exists).put(upload_image).delete(delete_image),
    )
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

/// Split `[dir/]name` into an optional directory and the file name.
fn split_path(path: &str) -> Result<(Option<&FsPath>, &str), Error> {
    let trimmed = path.trim_matches(['/', '\\']);
    let (dir, name) = match trimmed.rfind(['/', '\\']) {
        Some(idx) => (Some(&trimmed[..idx]), &trimmed[idx + 1..]),
        None => (None, trimmed),
    };
    if name.is_empty() {
        return Err(Error::from_status(400, path));
    }
    Ok((dir.filter(|d| !d.is_empty()).map(FsPath::new), name))
}

/// Store the raw request body.
///
/// The body is spooled to a temporary file first so the storage backend
/// sees the same input it would get from a multipart upload.
async fn upload_image(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
    body: Body,
) -> Result<impl IntoResponse, AppError> {
    let (dir, name) = split_path(&path)?;

    let spool = tempfile::NamedTempFile::new()
        .map_err(|e| Error::internal(format!("failed to create upload spool: {e}")))?;
    let std_file = spool
        .reopen()
        .map_err(|e| Error::internal(format!("failed to open upload spool: {e}")))?;
    let mut file = tokio::fs::File::from_std(std_file);

    let mut stream = body.into_data_stream();
    let mut received = 0usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::internal(format!("upload interrupted: {e}")))?;
        received += chunk.len();
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::internal(format!("failed to spool upload: {e}")))?;
    }
    file.flush()
        .await
        .map_err(|e| Error::internal(format!("failed to spool upload: {e}")))?;
    drop(file);

    tracing::debug!(name, bytes = received, "upload received");

    let image = UploadedImage::new(spool.path(), name);
    let url = ctx.storage.save(&image, dir).await?;

    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

async fn image_exists(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
) -> Result<Json<ExistsResponse>, AppError> {
    let (dir, name) = split_path(&path)?;
    let exists = ctx.storage.exists(name, dir).await;
    Ok(Json(ExistsResponse { exists }))
}

async fn delete_image(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
) -> Result<StatusCode, AppError> {
    let (dir, name) = split_path(&path)?;
    ctx.storage.delete(name, dir).await?;
    Ok(StatusCode::NO_CONTENT)
}
