//! Error types for the download module.
//!
//! Transfer errors carry the URL or path they concern so that the reason
//! string recorded in history and shown to the user is self-explanatory.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while streaming a bundle or icon to disk.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (create file, write, rename, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The transfer observed its cancellation token at a chunk boundary.
    #[error("download of {url} canceled after {bytes_written} bytes")]
    Canceled {
        /// The URL whose transfer was abandoned.
        url: String,
        /// Bytes written before the token was observed.
        bytes_written: u64,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a cancellation outcome.
    pub fn canceled(url: impl Into<String>, bytes_written: u64) -> Self {
        Self::Canceled {
            url: url.into(),
            bytes_written,
        }
    }

    /// Returns true when the transfer stopped because it was asked to.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled { .. })
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs the
// url or path, which the source errors do not carry.

/// Why an install request was refused before any transfer started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    /// A download for this name is already active.
    #[error("{app_name} is already being downloaded")]
    Conflict { app_name: String },

    /// The version selector matches neither the current nor an alternative version.
    #[error("{app_name} has no version {version}")]
    UnknownVersion { app_name: String, version: String },
}

/// No active download exists for the name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no active download for {app_name}")]
pub struct NotFoundError {
    pub app_name: String,
}

/// Failure to uninstall a bundle.
#[derive(Debug, Error)]
pub enum RemovalError {
    /// A download for this name is still running.
    #[error("{app_name} is being downloaded; cancel it first")]
    Busy { app_name: String },

    /// The installed artifact exists but could not be deleted.
    #[error("failed to delete {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
