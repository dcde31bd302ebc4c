//! Constants for the download module (timeouts, file naming).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default total request timeout for bundle transfers (30 minutes for large bundles).
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 1800;

/// Extension appended to every installed bundle.
pub const BUNDLE_EXTENSION: &str = "AppImage";

/// Suffix of in-flight temporary files; never matched by the installed check.
pub const PARTIAL_SUFFIX: &str = "part";
