//! Pixelstore-Common: Shared errors, path mapping, and localized messages.
//!
//! This crate provides the pieces every other pixelstore crate leans on:
//!
//! - **Error taxonomy**: the closed set of storage outcomes
//!   ([`ErrorKind`]) and the translation of raw I/O failures into it
//! - **Path mapping**: conversion between storage-root-relative paths and
//!   public URL paths, plus containment-checked request resolution
//! - **Message catalog**: localized user-facing strings via [`t!`]
//!
//! # Examples
//!
//! ```
//! use pixelstore_common::paths::{to_public_url, UrlLayout};
//! use std::path::Path;
//!
//! let layout = UrlLayout::new("/blog", "content/images");
//! let url = to_public_url(Path::new("/srv/images"), Path::new("2024/05/cat.jpg"), &layout);
//! assert_eq!(url, "/blog/content/images/2024/05/cat.jpg");
//! ```

pub mod error;
pub mod i18n;
pub mod paths;

pub use error::{Error, ErrorKind, Result};
