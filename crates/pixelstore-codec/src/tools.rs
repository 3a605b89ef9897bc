//! External codec tool detection.
//!
//! Stages never look tools up at build time; they spawn their configured
//! program and let a missing binary surface as a stage failure. The functions
//! here exist for diagnostics (`check-tools`) and for resolving configured
//! path overrides.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::CompressionConfig;
use crate::stages::StageKind;

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Stage the tool backs.
    pub stage: String,
    /// Program name or configured path.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
    /// Whether the stage is enabled in the active configuration.
    pub active: bool,
}

/// Check one program, preferring a configured path over `PATH` lookup.
pub fn check_tool(program: &Path) -> (Option<PathBuf>, Option<String>) {
    let Ok(path) = locate(program) else {
        return (None, None);
    };
    let version = detect_version(&path);
    (Some(path), version)
}

/// Check the tool behind every known stage.
///
/// Returns one entry per stage in canonical order, inactive stages included.
pub fn check_tools(config: &CompressionConfig) -> Vec<ToolInfo> {
    StageKind::ALL
        .iter()
        .map(|&kind| {
            let program = config.program_for(kind);
            let (path, version) = check_tool(&program);
            ToolInfo {
                stage: kind.as_str().to_string(),
                name: program.to_string_lossy().into_owned(),
                available: path.is_some(),
                version,
                path,
                active: config.is_active(kind),
            }
        })
        .collect()
}

fn locate(program: &Path) -> std::result::Result<PathBuf, which::Error> {
    if program.components().count() > 1 && program.exists() {
        return Ok(program.to_path_buf());
    }
    which::which(program)
}

/// Run `<tool> --version` and return the first non-empty output line.
///
/// Several codec tools print their banner to stderr, so both streams are
/// checked.
fn detect_version(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let version_arg = match name.as_ref() {
        "jpegtran" | "cjpeg" | "cwebp" => "-version",
        _ => "--version",
    };

    let output = std::process::Command::new(path)
        .arg(version_arg)
        .output()
        .ok()?;

    let line = [&output.stdout, &output.stderr]
        .into_iter()
        .flat_map(|stream| {
            String::from_utf8_lossy(stream)
                .lines()
                .map(|l| l.trim().to_string())
                .collect::<Vec<_>>()
        })
        .find(|line| !line.is_empty());
    line
}
