//! Image storage backends.
//!
//! The host platform talks to storage through the [`ImageStorage`] trait;
//! [`LocalImageStorage`] keeps images on the local filesystem and optionally
//! compresses them on the way in. Filename and directory choices are
//! delegated to a [`NamingStrategy`].

mod local;
mod naming;

pub use local::LocalImageStorage;
pub use naming::{sanitize_file_name, DatedNaming, NamingStrategy};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use pixelstore_common::Result;

/// An uploaded image waiting to be stored.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Where the uploaded bytes currently live (usually a temp file).
    pub path: PathBuf,
    /// Original file name as supplied by the uploader.
    pub name: String,
}

impl UploadedImage {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

/// Which stored image to read.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Storage-root-relative path, `/` or `\` separated.
    pub path: String,
}

impl ReadOptions {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Operations every image storage backend provides.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Persist `image` and return its public URL path.
    ///
    /// `target_dir` is either root-relative or an absolute path inside the
    /// storage root; when absent the backend picks one.
    async fn save(&self, image: &UploadedImage, target_dir: Option<&Path>) -> Result<String>;

    /// Read a stored image.
    async fn read(&self, options: &ReadOptions) -> Result<Bytes>;

    /// Whether `file_name` exists in `target_dir` (or the storage root).
    /// Never fails: anything that prevents a positive answer is `false`.
    async fn exists(&self, file_name: &str, target_dir: Option<&Path>) -> bool;

    /// Remove a stored image.
    async fn delete(&self, file_name: &str, target_dir: Option<&Path>) -> Result<()>;

    /// HTTP handler serving stored files, to be mounted at the URL layout's
    /// mount path.
    fn serve(&self) -> Router;
}
