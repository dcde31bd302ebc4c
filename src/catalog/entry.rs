//! Catalog record types.

use serde::{Deserialize, Serialize};

/// One advertised application.
///
/// Deserialization is lenient (missing fields default to empty) so the editor
/// can open incomplete catalogs; the store goes through
/// [`validate`](super::validation::validate) instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    #[serde(alias = "appimage_url")]
    pub bundle_url: String,
    pub icon_url: String,
    pub category: String,
    #[serde(alias = "app")]
    pub category_key: String,
    pub version: String,
    pub details: String,
    pub license: String,
    pub size: String,
    pub last_updated: String,
    pub screenshots: Vec<Screenshot>,
    pub tags: Vec<String>,
    pub alternative_versions: Vec<AlternativeVersion>,
}

/// Always serialized as `{url, caption}`; a bare URL string also
/// deserializes, with an empty caption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ScreenshotRepr")]
pub struct Screenshot {
    pub url: String,
    pub caption: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScreenshotRepr {
    Url(String),
    Full {
        #[serde(default)]
        url: String,
        #[serde(default)]
        caption: String,
    },
}

impl From<ScreenshotRepr> for Screenshot {
    fn from(repr: ScreenshotRepr) -> Self {
        match repr {
            ScreenshotRepr::Url(url) => Self {
                url,
                caption: String::new(),
            },
            ScreenshotRepr::Full { url, caption } => Self { url, caption },
        }
    }
}

/// An older or alternative build of the same application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternativeVersion {
    pub version: String,
    #[serde(alias = "appimage_url")]
    pub bundle_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// The version and URL an install request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: String,
    pub bundle_url: String,
}

impl CatalogEntry {
    /// Resolves a version selector against this entry.
    ///
    /// `None` selects the current version. A selector equal to the current
    /// version also selects it; otherwise the first matching alternative wins.
    #[must_use]
    pub fn resolve_version(&self, selector: Option<&str>) -> Option<ResolvedVersion> {
        match selector {
            None => Some(self.current_version()),
            Some(wanted) if wanted == self.version => Some(self.current_version()),
            Some(wanted) => self
                .alternative_versions
                .iter()
                .find(|alt| alt.version == wanted)
                .map(|alt| ResolvedVersion {
                    version: alt.version.clone(),
                    bundle_url: alt.bundle_url.clone(),
                }),
        }
    }

    fn current_version(&self) -> ResolvedVersion {
        ResolvedVersion {
            version: self.version.clone(),
            bundle_url: self.bundle_url.clone(),
        }
    }

    /// Every installable version, current first.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.version.as_str())
            .chain(self.alternative_versions.iter().map(|alt| alt.version.as_str()))
    }
}
