//! The compression pipeline: active stages applied in canonical order.

use std::path::Path;
use std::time::Instant;

use bytes::Bytes;

use crate::config::CompressionConfig;
use crate::format::ImageFormat;
use crate::stages::{build_stages, Stage, StageContext};
use crate::Result;

/// Ordered list of compression stages built once from configuration.
///
/// The pipeline holds no per-call state and can be shared between concurrent
/// saves behind an `Arc`.
#[derive(Debug)]
pub struct CompressionPipeline {
    stages: Vec<Box<dyn Stage>>,
    ctx: StageContext,
}

impl CompressionPipeline {
    /// Build the pipeline from `config`. Inactive and absent entries are
    /// skipped; an empty pipeline is valid and leaves images untouched.
    pub fn build(config: &CompressionConfig) -> Self {
        Self {
            stages: build_stages(config),
            ctx: StageContext {
                timeout: config.timeout,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Names of the configured stages, in application order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.kind().as_str()).collect()
    }

    /// Read the file at `source` and run it through every applicable stage.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or any applicable stage fails. Partial
    /// results are never returned.
    pub async fn apply(&self, source: &Path) -> Result<Bytes> {
        let data = Bytes::from(tokio::fs::read(source).await?);
        self.apply_bytes(data).await
    }

    /// Run `data` through every stage that accepts its format.
    pub async fn apply_bytes(&self, data: Bytes) -> Result<Bytes> {
        if self.stages.is_empty() {
            return Ok(data);
        }

        let format = ImageFormat::sniff(&data);
        let original_len = data.len();
        let mut current = data;

        for stage in &self.stages {
            if !stage.accepts(format) {
                tracing::trace!(stage = %stage.kind(), %format, "stage skipped");
                continue;
            }

            let started = Instant::now();
            let before = current.len();
            current = stage.compress(current, &self.ctx).await?;

            tracing::debug!(
                stage = %stage.kind(),
                %format,
                before,
                after = current.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "stage complete"
            );
        }

        if current.len() != original_len {
            tracing::debug!(%format, original_len, compressed_len = current.len(), "image compressed");
        }

        Ok(current)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::{JpegtranConfig, PngquantConfig};
    use crate::Error;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0fake jpeg body";

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn jpegtran_at(path: PathBuf) -> CompressionConfig {
        CompressionConfig {
            jpegtran: Some(JpegtranConfig {
                active: true,
                path: Some(path),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_pipeline_returns_input() {
        let pipeline = CompressionPipeline::build(&CompressionConfig::default());
        assert!(pipeline.is_empty());

        let out = pipeline.apply_bytes(Bytes::from_static(JPEG)).await.unwrap();
        assert_eq!(&out[..], JPEG);
    }

    #[tokio::test]
    async fn test_stage_output_replaces_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "jpegtran", "cat > /dev/null; printf small");
        let pipeline = CompressionPipeline::build(&jpegtran_at(tool));
        assert_eq!(pipeline.stage_names(), ["jpegtran"]);

        let out = pipeline.apply_bytes(Bytes::from_static(JPEG)).await.unwrap();
        assert_eq!(&out[..], b"small");
    }

    #[tokio::test]
    async fn test_mismatched_format_is_not_touched() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "jpegtran", "exit 1");
        let pipeline = CompressionPipeline::build(&jpegtran_at(tool));

        let png = Bytes::from_static(b"\x89PNG\r\n\x1a\nnot a jpeg");
        let out = pipeline.apply_bytes(png.clone()).await.unwrap();
        assert_eq!(out, png);
    }

    #[tokio::test]
    async fn test_failing_stage_fails_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "jpegtran", "cat > /dev/null; echo corrupt >&2; exit 2");
        let pipeline = CompressionPipeline::build(&jpegtran_at(tool));

        let err = pipeline.apply_bytes(Bytes::from_static(JPEG)).await.unwrap_err();
        assert!(matches!(err, Error::ToolFailed { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_missing_tool_fails_pipeline() {
        let config = CompressionConfig {
            pngquant: Some(PngquantConfig {
                active: true,
                path: Some(PathBuf::from("/nonexistent/pngquant")),
                ..Default::default()
            }),
            ..Default::default()
        };
        let pipeline = CompressionPipeline::build(&config);

        let err = pipeline
            .apply_bytes(Bytes::from_static(b"\x89PNG\r\n\x1a\nbody"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_apply_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.jpg");
        std::fs::write(&source, JPEG).unwrap();

        let pipeline = CompressionPipeline::build(&CompressionConfig::default());
        let out = pipeline.apply(&source).await.unwrap();
        assert_eq!(&out[..], JPEG);

        let missing = pipeline.apply(&dir.path().join("gone.jpg")).await;
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
