//! Search and category filtering over catalog entries.

use super::entry::CatalogEntry;

/// Category sentinel matching every entry.
pub const ALL_CATEGORIES: &str = "all";

/// Text query and category, combined with AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    query: String,
    category: String,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: ALL_CATEGORIES.to_string(),
        }
    }
}

impl CatalogFilter {
    #[must_use]
    pub fn new(query: impl AsRef<str>, category: impl Into<String>) -> Self {
        Self {
            query: query.as_ref().trim().to_lowercase(),
            category: category.into(),
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl AsRef<str>) -> Self {
        self.query = query.as_ref().trim().to_lowercase();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Case-insensitive substring match on name, description and tags; exact
    /// match on `category_key` unless the category is [`ALL_CATEGORIES`].
    #[must_use]
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        self.matches_category(entry) && self.matches_query(entry)
    }

    fn matches_category(&self, entry: &CatalogEntry) -> bool {
        self.category == ALL_CATEGORIES || entry.category_key == self.category
    }

    fn matches_query(&self, entry: &CatalogEntry) -> bool {
        if self.query.is_empty() {
            return true;
        }
        entry.name.to_lowercase().contains(&self.query)
            || entry.description.to_lowercase().contains(&self.query)
            || entry
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&self.query))
    }
}
