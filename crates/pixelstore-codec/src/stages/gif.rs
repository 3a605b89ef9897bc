//! GIF stages backed by `gifsicle` and its lossy giflossy build.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use super::{run_filter, Stage, StageContext, StageKind};
use crate::config::{GifsicleConfig, GiflossyConfig};
use crate::Result;

fn base_args(optimization_level: u8, interlaced: bool, colors: Option<u16>) -> Vec<String> {
    let mut args = vec![
        "--no-warnings".to_string(),
        "--no-app-extensions".to_string(),
        format!("--optimize={optimization_level}"),
    ];
    if interlaced {
        args.push("--interlace".into());
    }
    if let Some(colors) = colors {
        args.push("--colors".into());
        args.push(colors.to_string());
    }
    args
}

#[derive(Debug, Clone)]
pub struct GifsicleStage {
    program: PathBuf,
    config: GifsicleConfig,
}

impl GifsicleStage {
    pub fn new(program: PathBuf, config: GifsicleConfig) -> Self {
        Self { program, config }
    }

    fn args(&self) -> Vec<String> {
        base_args(
            self.config.optimization_level,
            self.config.interlaced,
            self.config.colors,
        )
    }
}

#[async_trait]
impl Stage for GifsicleStage {
    fn kind(&self) -> StageKind {
        StageKind::Gifsicle
    }

    async fn compress(&self, input: Bytes, ctx: &StageContext) -> Result<Bytes> {
        run_filter(&self.program, self.args(), input, ctx).await
    }
}

#[derive(Debug, Clone)]
pub struct GiflossyStage {
    program: PathBuf,
    config: GiflossyConfig,
}

impl GiflossyStage {
    pub fn new(program: PathBuf, config: GiflossyConfig) -> Self {
        Self { program, config }
    }

    fn args(&self) -> Vec<String> {
        let mut args = base_args(
            self.config.optimization_level,
            self.config.interlaced,
            self.config.colors,
        );
        if let Some(lossy) = self.config.lossy {
            args.push(format!("--lossy={lossy}"));
        }
        args
    }
}

#[async_trait]
impl Stage for GiflossyStage {
    fn kind(&self) -> StageKind {
        StageKind::Giflossy
    }

    async fn compress(&self, input: Bytes, ctx: &StageContext) -> Result<Bytes> {
        run_filter(&self.program, self.args(), input, ctx).await
    }
}
