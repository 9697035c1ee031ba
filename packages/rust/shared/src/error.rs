//! Error types for kbsync.
//!
//! Library crates use [`KbSyncError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// HTTP status for "not found" — tolerated on delete calls.
const NOT_FOUND: u16 = 404;

/// Top-level error type for all kbsync operations.
#[derive(Debug, thiserror::Error)]
pub enum KbSyncError {
    /// Configuration loading or validation error (missing env value, bad TOML).
    #[error("config error: {message}")]
    Config { message: String },

    /// A required local documentation file is absent.
    #[error("required file missing: {path:?}")]
    MissingFile { path: PathBuf },

    /// Transport-level failure (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response from the remote API, with its decoded message.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KbSyncError>;

impl KbSyncError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    /// Whether this is an HTTP 404 from the remote API.
    ///
    /// Delete calls treat 404 as success (the resource is already gone),
    /// so the pipeline checks this before propagating.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == NOT_FOUND)
    }
}
