//! Image compression through external codec tools.
//!
//! A [`CompressionPipeline`] is built once from a [`CompressionConfig`] and
//! applied to each uploaded image. Every active stage whose format matches
//! the image runs in turn; the first failure aborts the run so callers never
//! see a partially processed result.
//!
//! ```no_run
//! use pixelstore_codec::{CompressionConfig, CompressionPipeline};
//! use std::path::Path;
//!
//! # async fn example() -> pixelstore_codec::Result<()> {
//! let config: CompressionConfig = toml::from_str("[jpegtran]\nactive = true\n").unwrap();
//! let pipeline = CompressionPipeline::build(&config);
//! let bytes = pipeline.apply(Path::new("/tmp/upload.jpg")).await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod stages;
pub mod tools;
pub mod workspace;

pub use command::{ToolCommand, ToolOutput};
pub use config::CompressionConfig;
pub use error::{Error, Result};
pub use format::ImageFormat;
pub use pipeline::CompressionPipeline;
pub use stages::{Stage, StageKind};
pub use tools::{check_tool, check_tools, ToolInfo};
pub use workspace::Workspace;
