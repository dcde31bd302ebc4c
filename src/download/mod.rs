//! Bundle downloads: HTTP streaming, task state and the download manager.
//!
//! This module provides functionality for downloading bundles from HTTP/HTTPS
//! URLs with streaming support, so multi-gigabyte files never sit in memory.
//!
//! # Features
//!
//! - Streaming downloads to a hidden temporary file, renamed atomically
//! - Cooperative cancellation checked at every chunk boundary
//! - Configurable timeouts (30s connect, 30min total by default)
//! - Structured error types with full context
//! - One background tokio task per download, reporting over a channel
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bundleshop_core::catalog::CatalogEntry;
//! use bundleshop_core::download::{DownloadManager, HttpClient, ManagerEvent};
//! use bundleshop_core::history::HistoryStore;
//! use bundleshop_core::install::{InstallLayout, XdgDesktopMenu};
//! use std::path::Path;
//!
//! # async fn example(entry: CatalogEntry) -> Result<(), Box<dyn std::error::Error>> {
//! let layout = InstallLayout::under(Path::new("/tmp/bundles"));
//! let history = HistoryStore::open(Path::new("/tmp/bundles/history.json"));
//! let mut manager =
//!     DownloadManager::new(HttpClient::new(), layout, Arc::new(XdgDesktopMenu), history);
//!
//! manager.start_install(&entry, None)?;
//! while let Some(event) = manager.next_event().await {
//!     if let ManagerEvent::Finished { notice, .. } = event {
//!         println!("{notice}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod cancel;
mod client;
pub mod constants;
mod error;
mod manager;
mod task;
mod worker;

pub use cancel::CancelToken;
pub use client::{HttpClient, TransferProgress};
pub use error::{DownloadError, ManagerError, NotFoundError, RemovalError};
pub use manager::{DownloadManager, ManagerEvent};
pub use task::{DownloadTask, TaskStatus, format_bytes};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
