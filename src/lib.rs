//! Bundleshop Core Library
//!
//! This library provides the core of a storefront for portable application
//! bundles (AppImages): a hosted catalog is fetched, searched and filtered;
//! bundles are downloaded in the background, installed, removed and launched.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Catalog fetch, cache fallback, validation, search and editing
//! - [`download`] - Streaming HTTP client and the download manager state machine
//! - [`history`] - Persisted per-application download history
//! - [`install`] - Install layout, shortcuts, menu integration and installed state
//! - [`frontend`] - The confirmation/notification interface the core calls into
//! - [`config`] - Persisted settings and XDG paths
//! - [`shop`] - Application controller tying the components together

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod download;
pub mod frontend;
pub(crate) mod fs_util;
pub mod history;
pub mod install;
pub mod shop;
#[cfg(test)]
pub mod test_support;

// Re-export commonly used types
pub use catalog::{
    CatalogDocument, CatalogEntry, CatalogFilter, CatalogSnapshot, CatalogStore, FetchError,
    ValidationError,
};
pub use config::{Settings, Theme};
pub use download::{
    CancelToken, DownloadError, DownloadManager, DownloadTask, HttpClient, ManagerError,
    ManagerEvent, NotFoundError, RemovalError, TaskStatus,
};
pub use frontend::{Frontend, Notice, NoticeKind};
pub use history::{HistoryRecord, HistoryStore};
pub use install::{InstallLayout, InstalledState, MenuIntegration, NoMenu, XdgDesktopMenu};
pub use shop::{Shop, ShopError, ShopPaths};
