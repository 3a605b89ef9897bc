//! Scratch directory for file-based codec tools.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::TempDir;

use crate::format::ImageFormat;
use crate::{Error, Result};

/// Temporary directory holding one input and one output file.
///
/// Tools such as `optipng` and `cwebp` cannot be used as stdin/stdout
/// filters; they get a workspace instead. The directory and everything in it
/// is removed when the workspace is dropped.
///
/// # Example
///
/// ```no_run
/// use pixelstore_codec::{ImageFormat, Workspace};
///
/// # async fn example(png: bytes::Bytes) -> pixelstore_codec::Result<()> {
/// let workspace = Workspace::new(ImageFormat::Png)?;
/// workspace.write_input(&png).await?;
/// // run a tool reading workspace.input() and writing workspace.output()
/// let compressed = workspace.read_output().await?;
/// # Ok(())
/// # }
/// ```
pub struct Workspace {
    temp_dir: TempDir,
    input_path: PathBuf,
    output_path: PathBuf,
}

impl Workspace {
    /// Create a new workspace for an image of the given format.
    pub fn new(format: ImageFormat) -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("pixelstore-")
            .tempdir()
            .map_err(|e| Error::Workspace(e.to_string()))?;

        let input_path = temp_dir.path().join(format!("input.{}", format.extension()));
        let output_path = temp_dir.path().join(format!("output.{}", format.extension()));

        Ok(Self {
            temp_dir,
            input_path,
            output_path,
        })
    }

    /// Get the input file path.
    pub fn input(&self) -> &Path {
        &self.input_path
    }

    /// Get the output file path.
    pub fn output(&self) -> &Path {
        &self.output_path
    }

    #[cfg(test)]
    fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write the stage input.
    pub async fn write_input(&self, data: &[u8]) -> Result<()> {
        tokio::fs::write(&self.input_path, data)
            .await
            .map_err(|e| Error::Workspace(format!("failed to write input: {e}")))
    }

    /// Read what the tool wrote to [`Workspace::output`].
    pub async fn read_output(&self) -> Result<Bytes> {
        let data = tokio::fs::read(&self.output_path).await.map_err(|e| {
            Error::Workspace(format!(
                "failed to read output {}: {e}",
                self.output_path.display()
            ))
        })?;
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_paths() {
        let workspace = Workspace::new(ImageFormat::Png).unwrap();
        assert!(workspace.input().starts_with(workspace.temp_dir()));
        assert!(workspace.output().starts_with(workspace.temp_dir()));
        assert_eq!(workspace.input().extension().unwrap(), "png");
        assert_ne!(workspace.input(), workspace.output());
    }

    #[tokio::test]
    async fn test_missing_output_is_error() {
        let workspace = Workspace::new(ImageFormat::WebP).unwrap();
        workspace.write_input(b"data").await.unwrap();
        let err = workspace.read_output().await.unwrap_err();
        assert!(matches!(err, Error::Workspace(_)));
    }

    #[test]
    fn test_dropped_workspace_is_removed() {
        let workspace = Workspace::new(ImageFormat::Jpeg).unwrap();
        let dir = workspace.temp_dir().to_path_buf();
        assert!(dir.exists());
        drop(workspace);
        assert!(!dir.exists());
    }
}
