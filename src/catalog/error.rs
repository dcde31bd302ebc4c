//! Error types for the catalog module.

use std::path::PathBuf;

use thiserror::Error;

use crate::download::DownloadError;

/// Why one catalog record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("name must not be empty")]
    EmptyName,

    #[error("name `{name}` cannot be used as a file name")]
    UnsafeName { name: String },

    #[error("screenshot {index} needs string `{field}`")]
    InvalidScreenshot { index: usize, field: &'static str },

    #[error("alternative version {index} needs string `{field}`")]
    InvalidAlternativeVersion { index: usize, field: &'static str },

    #[error("name `{name}` repeats an earlier record")]
    DuplicateName { name: String },
}

/// A catalog payload that could not be read as a list of records.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog payload is not a JSON array")]
    NotAnArray,
}

/// One way of obtaining the catalog failed.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Neither the remote source nor the cache produced a catalog.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("catalog unavailable: {url} failed ({remote}); cache {cache_path} failed ({cache})")]
    Unavailable {
        url: String,
        remote: Box<SourceError>,
        cache_path: PathBuf,
        cache: Box<SourceError>,
    },

    #[error("no usable catalog cache at {cache_path}: {cache}")]
    NoCache {
        cache_path: PathBuf,
        cache: Box<SourceError>,
    },
}

/// Errors from the catalog editor document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a catalog: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot serialize catalog: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("an entry needs a name")]
    MissingName,
}

impl DocumentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
