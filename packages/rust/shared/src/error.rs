//! Error types for GitDocx.
//!
//! Library crates use [`GitDocxError`] via `thiserror`.
//! App crates (cli/server) wrap this with `color-eyre` or map it onto HTTP
//! responses.

use std::path::PathBuf;

/// Top-level error type for all GitDocx operations.
#[derive(Debug, thiserror::Error)]
pub enum GitDocxError {
    /// The repository address could not be translated into an API endpoint.
    #[error("invalid address: {message}")]
    InvalidAddress { message: String },

    /// A directory listing could not be fetched or decoded.
    #[error("{message}")]
    Listing { message: String },

    /// A single file's raw content could not be fetched.
    #[error("could not download file {name}: {message}")]
    Fetch { name: String, message: String },

    /// The count pass found nothing to render.
    #[error(
        "No files found with extensions {extensions}. Please check the URL and ensure \
         the repository contains files with those extensions."
    )]
    NoMatchingFiles { extensions: String },

    /// A document could not be serialized to its container file.
    #[error("document error for {path:?}: {message}")]
    Sink { path: PathBuf, message: String },

    /// A job or artifact lookup missed.
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level HTTP failure (client construction, body read).
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad request fields, empty runs, etc.).
    #[error("{message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GitDocxError>;

impl GitDocxError {
    /// Create an invalid-address error from any displayable message.
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress {
            message: msg.into(),
        }
    }

    /// Create a listing error from any displayable message.
    pub fn listing(msg: impl Into<String>) -> Self {
        Self::Listing {
            message: msg.into(),
        }
    }

    /// Create a fetch error for the named file.
    pub fn fetch(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a no-matching-files error listing the requested extensions.
    pub fn no_matching_files(extensions: &[String]) -> Self {
        Self::NoMatchingFiles {
            extensions: extensions.join(", "),
        }
    }

    /// Create a sink error for the document at `path`.
    pub fn sink(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Sink {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
