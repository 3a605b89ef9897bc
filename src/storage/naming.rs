//! Target-directory and unique-filename selection.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate};

use super::UploadedImage;

/// Give up after this many numbered candidates.
const MAX_SUFFIX: u32 = 10_000;

/// Decides where a new upload goes.
#[async_trait]
pub trait NamingStrategy: Send + Sync + fmt::Debug {
    /// Directory used when the caller supplies none.
    fn target_dir(&self, root: &Path) -> PathBuf;

    /// Pick and reserve a file name for `image` inside the existing directory
    /// `dir`. The returned path must not collide with any file that existed
    /// before, nor with a path handed to a concurrent caller.
    async fn unique_file_name(&self, image: &UploadedImage, dir: &Path) -> io::Result<PathBuf>;
}

/// Default strategy: `YYYY/MM` directories and `name-N.ext` suffixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatedNaming;

impl DatedNaming {
    fn dir_for(root: &Path, date: NaiveDate) -> PathBuf {
        root.join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()))
    }
}

#[async_trait]
impl NamingStrategy for DatedNaming {
    fn target_dir(&self, root: &Path) -> PathBuf {
        Self::dir_for(root, Local::now().date_naive())
    }

    async fn unique_file_name(&self, image: &UploadedImage, dir: &Path) -> io::Result<PathBuf> {
        let (stem, ext) = sanitize_file_name(&image.name);

        for n in 0..=MAX_SUFFIX {
            let name = match (n, ext.as_deref()) {
                (0, Some(ext)) => format!("{stem}.{ext}"),
                (0, None) => stem.clone(),
                (n, Some(ext)) => format!("{stem}-{n}.{ext}"),
                (n, None) => format!("{stem}-{n}"),
            };
            let candidate = dir.join(name);

            // create_new fails if the file exists, so the first caller to get
            // here owns the name.
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free file name for {:?} in {}", image.name, dir.display()),
        ))
    }
}

/// Split an uploaded file name into a safe stem and lowercase extension.
///
/// Any directory part is dropped. Characters other than letters, digits,
/// `_`, `@` and `.` become `-`; runs of `-` collapse. An empty stem becomes
/// `image`.
pub fn sanitize_file_name(name: &str) -> (String, Option<String>) {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let path = Path::new(base);

    let ext = path
        .extension()
        .map(|e| clean(&e.to_string_lossy()).to_lowercase())
        .filter(|e| !e.is_empty());
    let raw_stem = match ext {
        Some(_) => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        None => base.to_string(),
    };

    let stem = clean(&raw_stem);
    let stem = stem.trim_matches(['-', '.']);
    let stem = if stem.is_empty() { "image" } else { stem };

    (stem.to_string(), ext)
}

fn clean(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let c = if c.is_alphanumeric() || matches!(c, '_' | '@' | '.') {
            c
        } else {
            '-'
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out
}
