//! Mapping between storage paths and public URL paths.
//!
//! Stored images live under a storage root and are addressed with host
//! separators on disk. Public URLs are always `/`-delimited and take the form
//! `/<subdir>/<static_prefix>/<relative path>`. Conversion works on parsed path
//! components, so a Windows-style relative path maps to the same URL on every
//! host.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default URL prefix under which stored images are served.
pub const STATIC_IMAGE_URL_PREFIX: &str = "content/images";

const SEPARATORS: [char; 2] = ['/', '\\'];

/// The fixed parts of every public image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlLayout {
    /// Optional sub-directory the site is mounted under (e.g. `/blog`).
    pub subdir: String,
    /// Prefix identifying stored images (e.g. `content/images`).
    pub static_prefix: String,
}

impl Default for UrlLayout {
    fn default() -> Self {
        Self {
            subdir: String::new(),
            static_prefix: STATIC_IMAGE_URL_PREFIX.to_string(),
        }
    }
}

impl UrlLayout {
    pub fn new(subdir: impl Into<String>, static_prefix: impl Into<String>) -> Self {
        Self {
            subdir: subdir.into(),
            static_prefix: static_prefix.into(),
        }
    }

    /// The URL path at which the storage root is mounted, e.g.
    /// `/blog/content/images`. Returns `/` when both parts are empty.
    pub fn mount_path(&self) -> String {
        join_url(url_segments(&self.subdir).chain(url_segments(&self.static_prefix)))
    }
}

/// Split a string on either separator, dropping empty and `.` segments.
fn url_segments(s: &str) -> impl Iterator<Item = &str> {
    s.split(SEPARATORS).filter(|seg| !seg.is_empty() && *seg != ".")
}

fn join_url<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let mut url = String::from("/");
    for (i, segment) in segments.enumerate() {
        if i > 0 {
            url.push('/');
        }
        url.push_str(segment);
    }
    url
}

/// Map a stored file to its public URL path.
///
/// `target` may be absolute (it is made relative to `root`) or already
/// root-relative. Separators of either style become `/`.
///
/// # Examples
///
/// ```
/// use pixelstore_common::paths::{to_public_url, UrlLayout};
/// use std::path::Path;
///
/// let url = to_public_url(
///     Path::new("/srv/images"),
///     Path::new("/srv/images/2024/05/dog.png"),
///     &UrlLayout::default(),
/// );
/// assert_eq!(url, "/content/images/2024/05/dog.png");
/// ```
pub fn to_public_url(root: &Path, target: &Path, layout: &UrlLayout) -> String {
    let relative = target.strip_prefix(root).unwrap_or(target);

    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    join_url(
        url_segments(&layout.subdir)
            .chain(url_segments(&layout.static_prefix))
            .chain(parts.iter().flat_map(|p| url_segments(p))),
    )
}

/// Resolve a caller-supplied, root-relative path fragment onto `root`.
///
/// Trailing separators are stripped and a leading separator is ignored.
/// Any segment that would leave the root (`..`, a drive prefix, an absolute
/// component) is rejected with a `BadRequest` error before the filesystem is
/// touched.
///
/// # Examples
///
/// ```
/// use pixelstore_common::paths::resolve_request_path;
/// use std::path::{Path, PathBuf};
///
/// let root = Path::new("/srv/images");
/// assert_eq!(
///     resolve_request_path(root, "2024/05/cat.jpg/").unwrap(),
///     PathBuf::from("/srv/images/2024/05/cat.jpg"),
/// );
/// assert!(resolve_request_path(root, "../etc/passwd").is_err());
/// ```
pub fn resolve_request_path(root: &Path, requested: &str) -> Result<PathBuf> {
    let trimmed = requested.trim_end_matches(SEPARATORS);
    let mut resolved = root.to_path_buf();

    for segment in url_segments(trimmed) {
        if !is_plain_segment(segment) {
            return Err(Error::outside_root(requested));
        }
        resolved.push(segment);
    }

    Ok(resolved)
}

/// Resolve a directory given either as an absolute path under `root` or as a
/// root-relative path. Absolute paths outside the root are rejected.
pub fn resolve_within(root: &Path, dir: &Path) -> Result<PathBuf> {
    let display = dir.to_string_lossy();
    if dir.is_absolute() {
        let relative = dir
            .strip_prefix(root)
            .map_err(|_| Error::outside_root(&display))?;
        return resolve_request_path(root, &relative.to_string_lossy());
    }
    resolve_request_path(root, &display)
}

fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}
