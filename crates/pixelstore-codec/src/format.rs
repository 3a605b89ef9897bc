//! Image format sniffing.
//!
//! Stages decide whether they apply by looking at the bytes, not the file
//! extension: an uploaded `photo.png` that is really a JPEG is handled by the
//! JPEG stages.

use std::fmt;

/// Image formats the codec stages know how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    /// Anything else (SVG, ICO, unrecognized data); passed through untouched.
    Other,
}

impl ImageFormat {
    /// Detect the format of `data` from its magic bytes.
    pub fn sniff(data: &[u8]) -> Self {
        match image::guess_format(data) {
            Ok(image::ImageFormat::Jpeg) => Self::Jpeg,
            Ok(image::ImageFormat::Png) => Self::Png,
            Ok(image::ImageFormat::Gif) => Self::Gif,
            Ok(image::ImageFormat::WebP) => Self::WebP,
            _ => Self::Other,
        }
    }

    /// Conventional file extension, used to name workspace files.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
            Self::Other => "bin",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}
