//! Catalog of installable bundles.
//!
//! # Overview
//!
//! - [`CatalogStore`] fetches the hosted JSON array, validates each record and
//!   keeps a verbatim cache for offline use.
//! - [`CatalogFilter`] implements search and category filtering.
//! - [`CatalogDocument`] is the maintainer-side view used to edit the file.

mod document;
mod entry;
mod error;
mod filter;
mod store;
mod validation;

pub use document::{CatalogDocument, SaveOutcome};
pub use entry::{AlternativeVersion, CatalogEntry, ResolvedVersion, Screenshot};
pub use error::{DocumentError, FetchError, PayloadError, SourceError, ValidationError};
pub use filter::{ALL_CATEGORIES, CatalogFilter};
pub use store::{CatalogSnapshot, CatalogStore, RejectedRecord, parse_payload};
pub use validation::validate;
