//! JPEG stages: lossless `jpegtran` and lossy mozjpeg `cjpeg`.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use super::{run_filter, Stage, StageContext, StageKind};
use crate::config::{JpegtranConfig, MozjpegConfig};
use crate::Result;

/// Lossless Huffman-table optimization and metadata stripping.
#[derive(Debug, Clone)]
pub struct JpegtranStage {
    program: PathBuf,
    config: JpegtranConfig,
}

impl JpegtranStage {
    pub fn new(program: PathBuf, config: JpegtranConfig) -> Self {
        Self { program, config }
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec!["-copy".to_string(), "none".to_string()];
        if self.config.progressive {
            args.push("-progressive".into());
        }
        if self.config.arithmetic {
            args.push("-arithmetic".into());
        } else {
            args.push("-optimize".into());
        }
        args
    }
}

#[async_trait]
impl Stage for JpegtranStage {
    fn kind(&self) -> StageKind {
        StageKind::Jpegtran
    }

    async fn compress(&self, input: Bytes, ctx: &StageContext) -> Result<Bytes> {
        run_filter(&self.program, self.args(), input, ctx).await
    }
}

/// Lossy re-encode with mozjpeg's `cjpeg`, which accepts JPEG input.
#[derive(Debug, Clone)]
pub struct MozjpegStage {
    program: PathBuf,
    config: MozjpegConfig,
}

impl MozjpegStage {
    pub fn new(program: PathBuf, config: MozjpegConfig) -> Self {
        Self { program, config }
    }

    fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(quality) = self.config.quality {
            args.push("-quality".to_string());
            args.push(quality.to_string());
        }
        if !self.config.progressive {
            args.push("-baseline".into());
        }
        if let Some(smooth) = self.config.smooth {
            args.push("-smooth".into());
            args.push(smooth.to_string());
        }
        args
    }
}

#[async_trait]
impl Stage for MozjpegStage {
    fn kind(&self) -> StageKind {
        StageKind::Mozjpeg
    }

    async fn compress(&self, input: Bytes, ctx: &StageContext) -> Result<Bytes> {
        run_filter(&self.program, self.args(), input, ctx).await
    }
}
