//! Storage error taxonomy and I/O failure translation.
//!
//! Every failure that reaches the host platform is one of a closed set of
//! kinds ([`ErrorKind`]). Raw [`std::io::Error`]s are classified with
//! [`Error::from_io`]; HTTP statuses produced by the static-file layer are
//! classified with [`Error::from_status`]. Messages are localized through the
//! [`crate::i18n`] catalog and always reference the path involved.

use std::io;

use serde::Serialize;

use crate::t;

/// Closed set of storage outcome kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    NoPermission,
    Internal,
    NotImplemented,
}

impl ErrorKind {
    /// HTTP status code for this kind.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::BadRequest => 400,
            ErrorKind::NoPermission => 403,
            ErrorKind::Internal => 500,
            ErrorKind::NotImplemented => 501,
        }
    }

    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NoPermission => "no_permission",
            ErrorKind::Internal => "internal_error",
            ErrorKind::NotImplemented => "not_implemented",
        }
    }
}

/// Storage error carrying a localized message and the underlying cause.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The image (or a parent directory) does not exist.
    #[error("{message}")]
    NotFound {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// The request was malformed: overlong name, traversal, bad segment.
    #[error("{message}")]
    BadRequest {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// The filesystem refused access.
    #[error("{message}")]
    NoPermission {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// Anything not classified above.
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// The operation is not supported by this backend.
    #[error("{0}")]
    NotImplemented(String),
}

impl Error {
    /// Classify an I/O failure that happened while reading `path`.
    ///
    /// Missing files and non-directory path segments become
    /// [`ErrorKind::NotFound`], overlong names [`ErrorKind::BadRequest`],
    /// permission failures [`ErrorKind::NoPermission`]; everything else is
    /// [`ErrorKind::Internal`].
    pub fn from_io(err: io::Error, path: &str) -> Self {
        Self::classify_io(err, path, t!("errors.cannot_read_image", img = path))
    }

    /// Classify an I/O failure that happened while writing `path`.
    pub fn from_io_write(err: io::Error, path: &str) -> Self {
        Self::classify_io(err, path, t!("errors.cannot_write_image", img = path))
    }

    fn classify_io(err: io::Error, path: &str, internal_message: String) -> Self {
        match io_kind(&err) {
            ErrorKind::NotFound => Error::NotFound {
                message: t!("errors.image_not_found_with_ref", img = path),
                source: Some(err),
            },
            ErrorKind::BadRequest => Error::BadRequest {
                message: t!("errors.bad_request", img = path),
                source: Some(err),
            },
            ErrorKind::NoPermission => Error::NoPermission {
                message: t!("errors.no_permission", img = path),
                source: Some(err),
            },
            _ => Error::Internal {
                message: internal_message,
                source: Some(err),
            },
        }
    }

    /// Classify an error status returned by the static-file server.
    pub fn from_status(status: u16, path: &str) -> Self {
        match status {
            404 => Error::NotFound {
                message: t!("errors.image_not_found_with_ref", img = path),
                source: None,
            },
            400 => Error::BadRequest {
                message: t!("errors.bad_request", img = path),
                source: None,
            },
            403 => Error::NoPermission {
                message: t!("errors.no_permission", img = path),
                source: None,
            },
            _ => Error::Internal {
                message: t!("errors.serve_failed", img = path),
                source: None,
            },
        }
    }

    /// A requested path tried to leave the storage root.
    pub fn outside_root(path: &str) -> Self {
        Error::BadRequest {
            message: t!("errors.path_outside_root", img = path),
            source: None,
        }
    }

    /// The fixed outcome for unsupported operations.
    pub fn not_implemented() -> Self {
        Error::NotImplemented(t!("errors.not_implemented"))
    }

    /// Create an internal error with a free-form message.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// The taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::BadRequest { .. } => ErrorKind::BadRequest,
            Error::NoPermission { .. } => ErrorKind::NoPermission,
            Error::Internal { .. } => ErrorKind::Internal,
            Error::NotImplemented(_) => ErrorKind::NotImplemented,
        }
    }

    /// HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        self.kind().http_status()
    }
}

/// Result type alias using the storage [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

fn io_kind(err: &io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        io::ErrorKind::PermissionDenied => ErrorKind::NoPermission,
        _ => raw_os_kind(err).unwrap_or(ErrorKind::Internal),
    }
}

#[cfg(unix)]
fn raw_os_kind(err: &io::Error) -> Option<ErrorKind> {
    match err.raw_os_error()? {
        libc::ENOTDIR => Some(ErrorKind::NotFound),
        libc::ENAMETOOLONG => Some(ErrorKind::BadRequest),
        libc::EACCES | libc::EPERM => Some(ErrorKind::NoPermission),
        _ => None,
    }
}

#[cfg(not(unix))]
fn raw_os_kind(_err: &io::Error) -> Option<ErrorKind> {
    None
}
