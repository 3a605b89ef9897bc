//! Compression stage configuration.
//!
//! One optional entry per supported codec tool. Every entry carries an
//! `active` flag, an optional executable override, and the tool's own
//! parameters. Absent and inactive entries are skipped when the pipeline is
//! built; the order entries appear in does not matter.
//!
//! ```toml
//! [compression]
//! timeout_secs = 60
//!
//! [compression.mozjpeg]
//! active = true
//! quality = 80
//!
//! [compression.pngquant]
//! active = true
//! quality = [60, 80]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::DEFAULT_TIMEOUT;
use crate::stages::StageKind;

/// Full set of stage entries plus pipeline-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub jpegtran: Option<JpegtranConfig>,
    pub mozjpeg: Option<MozjpegConfig>,
    pub pngquant: Option<PngquantConfig>,
    #[serde(alias = "imageminOptipng")]
    pub optipng: Option<OptipngConfig>,
    pub gifsicle: Option<GifsicleConfig>,
    pub giflossy: Option<GiflossyConfig>,
    pub webp: Option<WebpConfig>,
    /// Maximum run time of a single tool invocation.
    #[serde(rename = "timeout_secs", with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            jpegtran: None,
            mozjpeg: None,
            pngquant: None,
            optipng: None,
            gifsicle: None,
            giflossy: None,
            webp: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CompressionConfig {
    /// Whether the entry for `kind` is present and active.
    pub fn is_active(&self, kind: StageKind) -> bool {
        match kind {
            StageKind::Jpegtran => self.jpegtran.as_ref().is_some_and(|c| c.active),
            StageKind::Mozjpeg => self.mozjpeg.as_ref().is_some_and(|c| c.active),
            StageKind::Pngquant => self.pngquant.as_ref().is_some_and(|c| c.active),
            StageKind::Optipng => self.optipng.as_ref().is_some_and(|c| c.active),
            StageKind::Gifsicle => self.gifsicle.as_ref().is_some_and(|c| c.active),
            StageKind::Giflossy => self.giflossy.as_ref().is_some_and(|c| c.active),
            StageKind::Webp => self.webp.as_ref().is_some_and(|c| c.active),
        }
    }

    /// Stages whose entries are active, in canonical order.
    pub fn active_stages(&self) -> Vec<StageKind> {
        StageKind::ALL
            .iter()
            .copied()
            .filter(|&kind| self.is_active(kind))
            .collect()
    }

    /// Program to spawn for `kind`: the configured override or the default
    /// binary name.
    pub fn program_for(&self, kind: StageKind) -> PathBuf {
        let custom = match kind {
            StageKind::Jpegtran => self.jpegtran.as_ref().and_then(|c| c.path.clone()),
            StageKind::Mozjpeg => self.mozjpeg.as_ref().and_then(|c| c.path.clone()),
            StageKind::Pngquant => self.pngquant.as_ref().and_then(|c| c.path.clone()),
            StageKind::Optipng => self.optipng.as_ref().and_then(|c| c.path.clone()),
            StageKind::Gifsicle => self.gifsicle.as_ref().and_then(|c| c.path.clone()),
            StageKind::Giflossy => self.giflossy.as_ref().and_then(|c| c.path.clone()),
            StageKind::Webp => self.webp.as_ref().and_then(|c| c.path.clone()),
        };
        custom.unwrap_or_else(|| PathBuf::from(kind.default_program()))
    }

    /// Non-fatal configuration issues.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(ref c) = self.mozjpeg {
            if c.quality.is_some_and(|q| q > 100) {
                warnings.push("compression.mozjpeg.quality must be 0-100".into());
            }
        }
        if let Some(ref c) = self.pngquant {
            if let Some([min, max]) = c.quality {
                if min > max || max > 100 {
                    warnings.push("compression.pngquant.quality must be [min, max] within 0-100".into());
                }
            }
            if c.speed.is_some_and(|s| !(1..=11).contains(&s)) {
                warnings.push("compression.pngquant.speed must be 1-11".into());
            }
        }
        if let Some(ref c) = self.optipng {
            if c.optimization_level > 7 {
                warnings.push("compression.optipng.optimization_level must be 0-7".into());
            }
        }
        if let Some(ref c) = self.gifsicle {
            if !(1..=3).contains(&c.optimization_level) {
                warnings.push("compression.gifsicle.optimization_level must be 1-3".into());
            }
        }
        if let Some(ref c) = self.webp {
            if c.quality > 100 || c.method > 6 {
                warnings.push("compression.webp quality must be 0-100 and method 0-6".into());
            }
        }
        if self.jpegtran.as_ref().is_some_and(|c| c.active)
            && self.mozjpeg.as_ref().is_some_and(|c| c.active)
        {
            warnings.push(
                "both jpegtran and mozjpeg are active; JPEGs pass through both, mozjpeg last".into(),
            );
        }
        if self.timeout.is_zero() {
            warnings.push("compression.timeout_secs is 0; every tool run will time out".into());
        }

        warnings
    }
}

/// Lossless JPEG optimization with `jpegtran`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JpegtranConfig {
    pub active: bool,
    pub path: Option<PathBuf>,
    /// Emit a progressive JPEG.
    pub progressive: bool,
    /// Use arithmetic coding instead of optimized Huffman tables.
    pub arithmetic: bool,
}

/// Lossy JPEG re-encoding with mozjpeg's `cjpeg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MozjpegConfig {
    pub active: bool,
    pub path: Option<PathBuf>,
    /// Compression quality, 0-100.
    pub quality: Option<u8>,
    pub progressive: bool,
    /// Smoothing factor, 0-100.
    pub smooth: Option<u8>,
}

impl Default for MozjpegConfig {
    fn default() -> Self {
        Self {
            active: false,
            path: None,
            quality: None,
            progressive: true,
            smooth: None,
        }
    }
}

/// Lossy palette quantization with `pngquant`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PngquantConfig {
    pub active: bool,
    pub path: Option<PathBuf>,
    /// Minimum and maximum quality, 0-100.
    pub quality: Option<[u8; 2]>,
    /// Speed/quality trade-off, 1 (brute force) to 11 (fastest).
    pub speed: Option<u8>,
    /// Maximum palette size, 2-256.
    pub colors: Option<u16>,
    /// Remove optional metadata chunks.
    pub strip: bool,
    /// Output lower-precision color, 0-4 bits.
    pub posterize: Option<u8>,
}

/// Lossless PNG optimization with `optipng`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptipngConfig {
    pub active: bool,
    pub path: Option<PathBuf>,
    /// Optimization level, 0-7.
    pub optimization_level: u8,
    pub bit_depth_reduction: bool,
    pub color_type_reduction: bool,
    pub palette_reduction: bool,
    pub interlaced: Option<bool>,
}

impl Default for OptipngConfig {
    fn default() -> Self {
        Self {
            active: false,
            path: None,
            optimization_level: 3,
            bit_depth_reduction: true,
            color_type_reduction: true,
            palette_reduction: true,
            interlaced: None,
        }
    }
}

/// GIF optimization with `gifsicle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GifsicleConfig {
    pub active: bool,
    pub path: Option<PathBuf>,
    pub interlaced: bool,
    /// Optimization level, 1-3.
    pub optimization_level: u8,
    /// Reduce the palette to at most this many colors.
    pub colors: Option<u16>,
}

impl Default for GifsicleConfig {
    fn default() -> Self {
        Self {
            active: false,
            path: None,
            interlaced: false,
            optimization_level: 1,
            colors: None,
        }
    }
}

/// Lossy GIF compression with the giflossy build of `gifsicle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GiflossyConfig {
    pub active: bool,
    pub path: Option<PathBuf>,
    pub interlaced: bool,
    pub optimization_level: u8,
    pub colors: Option<u16>,
    /// Lossiness; higher trades quality for size.
    pub lossy: Option<u32>,
}

impl Default for GiflossyConfig {
    fn default() -> Self {
        Self {
            active: false,
            path: None,
            interlaced: false,
            optimization_level: 1,
            colors: None,
            lossy: None,
        }
    }
}

/// WebP recompression with `cwebp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebpConfig {
    pub active: bool,
    pub path: Option<PathBuf>,
    /// Quality factor, 0-100.
    pub quality: u8,
    /// Alpha channel quality, 0-100.
    pub alpha_quality: u8,
    /// Compression method, 0 (fast) to 6 (slowest, smallest).
    pub method: u8,
    pub lossless: bool,
}

impl Default for WebpConfig {
    fn default() -> Self {
        Self {
            active: false,
            path: None,
            quality: 75,
            alpha_quality: 100,
            method: 4,
            lossless: false,
        }
    }
}

/// Serde helpers to (de)serialize `Duration` as whole seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
