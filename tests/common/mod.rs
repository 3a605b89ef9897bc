//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which owns a temporary storage root, a
//! [`LocalImageStorage`] over it, and an [`AppContext`] for router tests.
//! Helpers generate real image fixtures and stand-in codec tools.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::Router;
use pixelstore::config::Config;
use pixelstore::server::{create_router, AppContext};
use pixelstore::storage::{LocalImageStorage, UploadedImage};
use pixelstore_codec::{CompressionConfig, CompressionPipeline};
use pixelstore_common::paths::UrlLayout;
use tempfile::TempDir;

/// Test harness wrapping a storage root and the context built on it.
pub struct TestHarness {
    pub root: TempDir,
    pub uploads: TempDir,
    pub storage: LocalImageStorage,
    pub ctx: AppContext,
    uploaded: AtomicUsize,
}

impl TestHarness {
    /// Storage with no compression stages and the default URL layout.
    pub fn new() -> Self {
        Self::build(CompressionConfig::default(), UrlLayout::default())
    }

    /// Storage whose pipeline is built from `compression`.
    pub fn with_compression(compression: CompressionConfig) -> Self {
        Self::build(compression, UrlLayout::default())
    }

    /// Storage served under a custom URL layout.
    pub fn with_layout(layout: UrlLayout) -> Self {
        Self::build(CompressionConfig::default(), layout)
    }

    fn build(compression: CompressionConfig, layout: UrlLayout) -> Self {
        let root = tempfile::tempdir().expect("failed to create storage root");
        let uploads = tempfile::tempdir().expect("failed to create upload dir");

        let pipeline = Arc::new(CompressionPipeline::build(&compression));
        let storage = LocalImageStorage::new(root.path(), layout.clone(), pipeline);

        let mut config = Config::default();
        config.storage.root = root.path().to_path_buf();
        config.storage.subdir = layout.subdir.clone();
        config.storage.static_prefix = layout.static_prefix.clone();
        config.compression = compression;

        let ctx = AppContext {
            config: Arc::new(config),
            storage: Arc::new(storage.clone()),
        };

        Self {
            root,
            uploads,
            storage,
            ctx,
            uploaded: AtomicUsize::new(0),
        }
    }

    /// The full application router.
    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    /// Place `data` in the upload area as `name` and describe it. Each call
    /// gets its own directory, so repeated names keep their own contents.
    pub fn upload(&self, name: &str, data: &[u8]) -> UploadedImage {
        let n = self.uploaded.fetch_add(1, Ordering::Relaxed);
        let dir = self.uploads.path().join(n.to_string());
        std::fs::create_dir_all(&dir).expect("failed to create upload dir");
        let path = dir.join(name);
        std::fs::write(&path, data).expect("failed to write upload");
        UploadedImage::new(path, name)
    }

    /// Write a file directly under the storage root.
    pub fn put_file(&self, relative: &str, data: &[u8]) -> PathBuf {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent");
        }
        std::fs::write(&path, data).expect("failed to write stored file");
        path
    }

    pub fn root_path(&self) -> &Path {
        self.root.path()
    }
}

/// An uncompressed-ish PNG with plenty of redundancy: a smooth gradient
/// written with the fastest deflate setting and no filtering.
pub fn compressible_png() -> Vec<u8> {
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};
    use image::{ImageEncoder, RgbImage};

    let img = RgbImage::from_fn(128, 128, |x, y| image::Rgb([(x * 2) as u8, (y * 2) as u8, 128]));
    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter)
        .write_image(img.as_raw(), 128, 128, image::ExtendedColorType::Rgb8)
        .expect("failed to encode png");
    out
}

/// A baseline JPEG produced by the `image` encoder.
pub fn sample_jpeg() -> Vec<u8> {
    let img = image::RgbImage::from_fn(96, 96, |x, y| image::Rgb([x as u8, y as u8, (x ^ y) as u8]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("failed to encode jpeg");
    out.into_inner()
}

/// Write an executable shell script standing in for a codec tool.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write tool");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("failed to chmod tool");
    path
}

/// Whether `program` can be found on `PATH`.
pub fn tool_available(program: &str) -> bool {
    pixelstore_codec::check_tool(Path::new(program)).0.is_some()
}
