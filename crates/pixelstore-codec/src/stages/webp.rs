//! WebP recompression with `cwebp`.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use super::{non_empty, Stage, StageContext, StageKind};
use crate::command::ToolCommand;
use crate::config::WebpConfig;
use crate::format::ImageFormat;
use crate::workspace::Workspace;
use crate::Result;

/// Re-encodes WebP images. Other formats are never converted to WebP since
/// the stored file keeps its original name and extension.
#[derive(Debug, Clone)]
pub struct WebpStage {
    program: PathBuf,
    config: WebpConfig,
}

impl WebpStage {
    pub fn new(program: PathBuf, config: WebpConfig) -> Self {
        Self { program, config }
    }

    fn build_command(&self, workspace: &Workspace, ctx: &StageContext) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.arg("-quiet");
        cmd.args(["-q".to_string(), self.config.quality.to_string()]);
        cmd.args(["-alpha_q".to_string(), self.config.alpha_quality.to_string()]);
        cmd.args(["-m".to_string(), self.config.method.to_string()]);
        if self.config.lossless {
            cmd.arg("-lossless");
        }
        cmd.path_arg(workspace.input());
        cmd.arg("-o").path_arg(workspace.output());
        cmd.timeout(ctx.timeout);
        cmd
    }
}

#[async_trait]
impl Stage for WebpStage {
    fn kind(&self) -> StageKind {
        StageKind::Webp
    }

    async fn compress(&self, input: Bytes, ctx: &StageContext) -> Result<Bytes> {
        let workspace = Workspace::new(ImageFormat::WebP)?;
        workspace.write_input(&input).await?;

        self.build_command(&workspace, ctx).execute().await?;

        let data = workspace.read_output().await?;
        non_empty(&self.program, data)
    }
}
