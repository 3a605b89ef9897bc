//! PNG stages: lossy `pngquant` and lossless `optipng`.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use super::{non_empty, Stage, StageContext, StageKind};
use crate::command::ToolCommand;
use crate::config::{OptipngConfig, PngquantConfig};
use crate::format::ImageFormat;
use crate::workspace::Workspace;
use crate::Result;

/// pngquant exits with this code when the result would fall below the
/// configured minimum quality.
const PNGQUANT_QUALITY_TOO_LOW: i32 = 99;

/// Palette quantization with `pngquant`.
#[derive(Debug, Clone)]
pub struct PngquantStage {
    program: PathBuf,
    config: PngquantConfig,
}

impl PngquantStage {
    pub fn new(program: PathBuf, config: PngquantConfig) -> Self {
        Self { program, config }
    }

    fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(speed) = self.config.speed {
            args.push("--speed".to_string());
            args.push(speed.to_string());
        }
        if self.config.strip {
            args.push("--strip".into());
        }
        if let Some([min, max]) = self.config.quality {
            args.push(format!("--quality={min}-{max}"));
        }
        if let Some(bits) = self.config.posterize {
            args.push("--posterize".into());
            args.push(bits.to_string());
        }
        if let Some(colors) = self.config.colors {
            args.push(colors.to_string());
        }
        args.push("-".into());
        args
    }
}

#[async_trait]
impl Stage for PngquantStage {
    fn kind(&self) -> StageKind {
        StageKind::Pngquant
    }

    async fn compress(&self, input: Bytes, ctx: &StageContext) -> Result<Bytes> {
        let output = ToolCommand::new(self.program.clone())
            .args(self.args())
            .stdin(input.to_vec())
            .timeout(ctx.timeout)
            .accept_exit_code(PNGQUANT_QUALITY_TOO_LOW)
            .execute()
            .await?;

        if output.status.code() == Some(PNGQUANT_QUALITY_TOO_LOW) {
            tracing::debug!("pngquant could not reach minimum quality, keeping input");
            return Ok(input);
        }

        non_empty(&self.program, Bytes::from(output.stdout))
    }
}

/// Lossless recompression with `optipng`, run against workspace files.
#[derive(Debug, Clone)]
pub struct OptipngStage {
    program: PathBuf,
    config: OptipngConfig,
}

impl OptipngStage {
    pub fn new(program: PathBuf, config: OptipngConfig) -> Self {
        Self { program, config }
    }

    fn build_command(&self, workspace: &Workspace, ctx: &StageContext) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.args(["-quiet", "-strip", "all", "-clobber", "-fix"]);
        cmd.arg(format!("-o{}", self.config.optimization_level));
        if !self.config.bit_depth_reduction {
            cmd.arg("-nb");
        }
        if !self.config.color_type_reduction {
            cmd.arg("-nc");
        }
        if !self.config.palette_reduction {
            cmd.arg("-np");
        }
        if let Some(interlaced) = self.config.interlaced {
            cmd.args(["-i", if interlaced { "1" } else { "0" }]);
        }
        cmd.arg("-out").path_arg(workspace.output());
        cmd.path_arg(workspace.input());
        cmd.timeout(ctx.timeout);
        cmd
    }
}

#[async_trait]
impl Stage for OptipngStage {
    fn kind(&self) -> StageKind {
        StageKind::Optipng
    }

    async fn compress(&self, input: Bytes, ctx: &StageContext) -> Result<Bytes> {
        let workspace = Workspace::new(ImageFormat::Png)?;
        workspace.write_input(&input).await?;

        self.build_command(&workspace, ctx).execute().await?;

        let data = workspace.read_output().await?;
        non_empty(&self.program, data)
    }
}
