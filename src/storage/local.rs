//! Local filesystem storage with compression on save.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Router,
};
use bytes::Bytes;
use pixelstore_codec::{CompressionConfig, CompressionPipeline};
use pixelstore_common::paths::{resolve_request_path, resolve_within, to_public_url, UrlLayout};
use pixelstore_common::{Error, Result};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use super::{DatedNaming, ImageStorage, NamingStrategy, ReadOptions, UploadedImage};
use crate::config::StorageConfig;
use crate::server::error::AppError;

const ONE_YEAR: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Stores images under a root directory on the local filesystem.
///
/// Cheap to clone; clones share the naming strategy and the compression
/// pipeline.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
    layout: UrlLayout,
    cache_max_age: Duration,
    naming: Arc<dyn NamingStrategy>,
    pipeline: Arc<CompressionPipeline>,
}

impl LocalImageStorage {
    /// A relative `root` is anchored to the current directory so absolute
    /// target directories under it resolve.
    pub fn new(root: impl Into<PathBuf>, layout: UrlLayout, pipeline: Arc<CompressionPipeline>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self {
            root,
            layout,
            cache_max_age: ONE_YEAR,
            naming: Arc::new(DatedNaming),
            pipeline,
        }
    }

    /// Build storage and its compression pipeline from configuration.
    pub fn from_config(storage: &StorageConfig, compression: &CompressionConfig) -> Self {
        let pipeline = Arc::new(CompressionPipeline::build(compression));
        Self::new(storage.root.clone(), storage.url_layout(), pipeline)
            .with_cache_max_age(storage.cache_max_age())
    }

    pub fn with_naming(mut self, naming: Arc<dyn NamingStrategy>) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_cache_max_age(mut self, max_age: Duration) -> Self {
        self.cache_max_age = max_age;
        self
    }

    pub fn pipeline(&self) -> &CompressionPipeline {
        &self.pipeline
    }

    /// Public URL of a stored file.
    pub fn url_for(&self, target: &Path) -> String {
        to_public_url(&self.root, target, &self.layout)
    }

    /// Write `data` verbatim at the root-relative `target_path`, creating
    /// parent directories, and return its public URL. Existing files are
    /// overwritten; no compression is applied.
    pub async fn save_raw(&self, data: Bytes, target_path: &str) -> Result<String> {
        let target = resolve_request_path(&self.root, target_path)?;
        if target == self.root {
            return Err(Error::outside_root(target_path));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::from_io_write(e, target_path))?;
        }
        tokio::fs::write(&target, &data)
            .await
            .map_err(|e| Error::from_io_write(e, target_path))?;

        tracing::debug!(path = %target.display(), bytes = data.len(), "raw image stored");
        Ok(self.url_for(&target))
    }

    /// Run the pipeline over `original`, falling back to it on any failure.
    async fn compress_or_original(&self, original: Bytes, name: &str) -> Bytes {
        if self.pipeline.is_empty() {
            return original;
        }

        let started = Instant::now();
        match self.pipeline.apply_bytes(original.clone()).await {
            Ok(compressed) => {
                tracing::debug!(
                    image = name,
                    original = original.len(),
                    compressed = compressed.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "image compressed"
                );
                compressed
            }
            Err(e) => {
                tracing::warn!(image = name, error = %e, "compression failed, storing original");
                original
            }
        }
    }

    fn relative_display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn save(&self, image: &UploadedImage, target_dir: Option<&Path>) -> Result<String> {
        let dir = match target_dir {
            Some(dir) => resolve_within(&self.root, dir)?,
            None => self.naming.target_dir(&self.root),
        };
        let dir_display = self.relative_display(&dir);

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::from_io_write(e, &dir_display))?;

        let target = self
            .naming
            .unique_file_name(image, &dir)
            .await
            .map_err(|e| Error::from_io_write(e, &dir_display))?;
        let target_display = self.relative_display(&target);

        let result = async {
            let original = tokio::fs::read(&image.path)
                .await
                .map_err(|e| Error::from_io(e, &image.path.to_string_lossy()))?;
            let data = self.compress_or_original(Bytes::from(original), &image.name).await;

            tokio::fs::write(&target, &data)
                .await
                .map_err(|e| Error::from_io_write(e, &target_display))?;
            Ok::<usize, Error>(data.len())
        }
        .await;

        match result {
            Ok(bytes) => {
                tracing::info!(image = %image.name, path = %target_display, bytes, "image saved");
                Ok(self.url_for(&target))
            }
            Err(e) => {
                // Release the reserved name.
                let _ = tokio::fs::remove_file(&target).await;
                Err(e)
            }
        }
    }

    async fn read(&self, options: &ReadOptions) -> Result<Bytes> {
        let path = resolve_request_path(&self.root, &options.path)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::from_io(e, &options.path))?;
        Ok(Bytes::from(data))
    }

    async fn exists(&self, file_name: &str, target_dir: Option<&Path>) -> bool {
        let dir = match target_dir {
            Some(dir) => match resolve_within(&self.root, dir) {
                Ok(dir) => dir,
                Err(_) => return false,
            },
            None => self.root.clone(),
        };
        let Ok(path) = resolve_request_path(&dir, file_name) else {
            return false;
        };
        if path == dir {
            return false;
        }

        match tokio::fs::metadata(&path).await {
            Ok(_) => true,
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "exists check failed");
                false
            }
        }
    }

    async fn delete(&self, _file_name: &str, _target_dir: Option<&Path>) -> Result<()> {
        Err(Error::not_implemented())
    }

    fn serve(&self) -> Router {
        let state = ServeState {
            dir: ServeDir::new(&self.root).append_index_html_on_directories(false),
            cache_control: cache_control(self.cache_max_age),
        };
        Router::new().fallback(serve_image).with_state(state)
    }
}

#[derive(Clone)]
struct ServeState {
    dir: ServeDir,
    cache_control: HeaderValue,
}

fn cache_control(max_age: Duration) -> HeaderValue {
    HeaderValue::from_str(&format!("public, max-age={}", max_age.as_secs()))
        .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=31536000"))
}

async fn serve_image(State(state): State<ServeState>, request: Request) -> Response {
    let started = Instant::now();
    let path = request.uri().path().trim_start_matches('/').to_string();

    let response = match state.dir.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        tracing::debug!(%path, status = status.as_u16(), "image not served");
        return AppError::from(Error::from_status(status.as_u16(), &path)).into_response();
    }

    let mut response = response.map(Body::new);
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, state.cache_control);

    tracing::info!(
        %path,
        status = status.as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "image served"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_control_header() {
        assert_eq!(
            cache_control(Duration::from_secs(60)),
            HeaderValue::from_static("public, max-age=60")
        );
        assert_eq!(
            cache_control(ONE_YEAR),
            HeaderValue::from_static("public, max-age=31536000")
        );
    }

    #[test]
    fn test_relative_root_accepts_absolute_target_dir() {
        let storage = LocalImageStorage::new(
            "content/images",
            UrlLayout::default(),
            Arc::new(CompressionPipeline::build(&CompressionConfig::default())),
        );
        assert!(storage.root.is_absolute());

        let target = std::env::current_dir().unwrap().join("content/images/2024/05");
        assert_eq!(resolve_within(&storage.root, &target).unwrap(), target);
        assert_eq!(
            storage.url_for(&target.join("dog.png")),
            "/content/images/2024/05/dog.png"
        );
    }

    #[tokio::test]
    async fn test_save_raw_rejects_root_and_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(
            dir.path(),
            UrlLayout::default(),
            Arc::new(CompressionPipeline::build(&CompressionConfig::default())),
        );

        let err = storage.save_raw(Bytes::from_static(b"x"), "").await.unwrap_err();
        assert_eq!(err.kind(), pixelstore_common::ErrorKind::BadRequest);

        let err = storage
            .save_raw(Bytes::from_static(b"x"), "../escape.png")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), pixelstore_common::ErrorKind::BadRequest);
    }
}
