//! Compression stages, one per external codec tool.
//!
//! A [`Stage`] takes image bytes and returns (hopefully smaller) image bytes.
//! Stages only touch formats they understand; [`accepts`](Stage::accepts)
//! gates them on the sniffed format and the pipeline passes other images
//! through untouched.

mod gif;
mod jpeg;
mod png;
mod webp;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::command::ToolCommand;
use crate::config::CompressionConfig;
use crate::format::ImageFormat;
use crate::{Error, Result};

pub use gif::{GiflossyStage, GifsicleStage};
pub use jpeg::{JpegtranStage, MozjpegStage};
pub use png::{OptipngStage, PngquantStage};
pub use webp::WebpStage;

/// Known stages in canonical application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Jpegtran,
    Mozjpeg,
    Pngquant,
    Optipng,
    Gifsicle,
    Giflossy,
    Webp,
}

impl StageKind {
    /// Every stage, in the order the pipeline applies them.
    pub const ALL: [StageKind; 7] = [
        StageKind::Jpegtran,
        StageKind::Mozjpeg,
        StageKind::Pngquant,
        StageKind::Optipng,
        StageKind::Gifsicle,
        StageKind::Giflossy,
        StageKind::Webp,
    ];

    /// Configuration key of this stage.
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Jpegtran => "jpegtran",
            StageKind::Mozjpeg => "mozjpeg",
            StageKind::Pngquant => "pngquant",
            StageKind::Optipng => "optipng",
            StageKind::Gifsicle => "gifsicle",
            StageKind::Giflossy => "giflossy",
            StageKind::Webp => "webp",
        }
    }

    /// Executable spawned when no path override is configured.
    pub fn default_program(self) -> &'static str {
        match self {
            StageKind::Jpegtran => "jpegtran",
            StageKind::Mozjpeg => "cjpeg",
            StageKind::Pngquant => "pngquant",
            StageKind::Optipng => "optipng",
            StageKind::Gifsicle | StageKind::Giflossy => "gifsicle",
            StageKind::Webp => "cwebp",
        }
    }

    /// The image format this stage operates on.
    pub fn format(self) -> ImageFormat {
        match self {
            StageKind::Jpegtran | StageKind::Mozjpeg => ImageFormat::Jpeg,
            StageKind::Pngquant | StageKind::Optipng => ImageFormat::Png,
            StageKind::Gifsicle | StageKind::Giflossy => ImageFormat::Gif,
            StageKind::Webp => ImageFormat::WebP,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run settings shared by every stage.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Maximum run time of a single tool invocation.
    pub timeout: Duration,
}

/// A single compression step backed by one external tool.
#[async_trait]
pub trait Stage: Send + Sync + fmt::Debug {
    /// Which stage this is.
    fn kind(&self) -> StageKind;

    /// Whether this stage should run on an image of `format`.
    fn accepts(&self, format: ImageFormat) -> bool {
        format == self.kind().format()
    }

    /// Compress `input`, returning the new bytes.
    async fn compress(&self, input: Bytes, ctx: &StageContext) -> Result<Bytes>;
}

/// Create the active stages described by `config`, in canonical order.
///
/// No tool lookup happens here; a missing executable surfaces when the stage
/// runs.
pub fn build_stages(config: &CompressionConfig) -> Vec<Box<dyn Stage>> {
    let mut stages: Vec<Box<dyn Stage>> = Vec::new();

    for kind in config.active_stages() {
        let program = config.program_for(kind);
        let stage: Box<dyn Stage> = match kind {
            StageKind::Jpegtran => Box::new(JpegtranStage::new(
                program,
                config.jpegtran.clone().unwrap_or_default(),
            )),
            StageKind::Mozjpeg => Box::new(MozjpegStage::new(
                program,
                config.mozjpeg.clone().unwrap_or_default(),
            )),
            StageKind::Pngquant => Box::new(PngquantStage::new(
                program,
                config.pngquant.clone().unwrap_or_default(),
            )),
            StageKind::Optipng => Box::new(OptipngStage::new(
                program,
                config.optipng.clone().unwrap_or_default(),
            )),
            StageKind::Gifsicle => Box::new(GifsicleStage::new(
                program,
                config.gifsicle.clone().unwrap_or_default(),
            )),
            StageKind::Giflossy => Box::new(GiflossyStage::new(
                program,
                config.giflossy.clone().unwrap_or_default(),
            )),
            StageKind::Webp => Box::new(WebpStage::new(
                program,
                config.webp.clone().unwrap_or_default(),
            )),
        };
        stages.push(stage);
    }

    stages
}

/// Run a filter-style tool: image on stdin, result on stdout.
pub(crate) async fn run_filter(
    program: &Path,
    args: Vec<String>,
    input: Bytes,
    ctx: &StageContext,
) -> Result<Bytes> {
    let output = ToolCommand::new(program.to_path_buf())
        .args(args)
        .stdin(input.to_vec())
        .timeout(ctx.timeout)
        .execute()
        .await?;

    non_empty(program, Bytes::from(output.stdout))
}

pub(crate) fn non_empty(program: &Path, data: Bytes) -> Result<Bytes> {
    if data.is_empty() {
        return Err(Error::EmptyOutput {
            tool: program.to_string_lossy().into_owned(),
        });
    }
    Ok(data)
}
