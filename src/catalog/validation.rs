//! Field-by-field validation of raw catalog records.

use serde_json::{Map, Value};

use super::entry::{AlternativeVersion, CatalogEntry, Screenshot};
use super::error::ValidationError;

/// Validates one raw record and converts it into a [`CatalogEntry`].
///
/// Legacy keys (`appimage_url`, `app`) are accepted when the canonical key is
/// absent. Duplicate detection needs the whole snapshot and happens in the
/// store.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate(record: &Value) -> Result<CatalogEntry, ValidationError> {
    let Value::Object(map) = record else {
        return Err(ValidationError::NotAnObject);
    };

    let name = required_str(map, "name", None)?;
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.contains('/') || name.contains('\0') || name.starts_with('.') {
        return Err(ValidationError::UnsafeName { name });
    }

    Ok(CatalogEntry {
        name,
        description: required_str(map, "description", None)?,
        bundle_url: required_str(map, "bundle_url", Some("appimage_url"))?,
        icon_url: required_str(map, "icon_url", None)?,
        category: required_str(map, "category", None)?,
        category_key: required_str(map, "category_key", Some("app"))?,
        version: required_str(map, "version", None)?,
        details: required_str(map, "details", None)?,
        license: required_str(map, "license", None)?,
        size: required_str(map, "size", None)?,
        last_updated: required_str(map, "last_updated", None)?,
        screenshots: screenshots(map)?,
        tags: tags(map)?,
        alternative_versions: alternative_versions(map)?,
    })
}

fn required_str(
    map: &Map<String, Value>,
    field: &'static str,
    legacy: Option<&str>,
) -> Result<String, ValidationError> {
    let value = map
        .get(field)
        .or_else(|| legacy.and_then(|key| map.get(key)));
    match value {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn optional_list<'a>(
    map: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a [Value], ValidationError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "a list",
        }),
    }
}

fn str_field<'a>(item: &'a Value, field: &str) -> Option<&'a str> {
    item.get(field).and_then(Value::as_str)
}

fn screenshots(map: &Map<String, Value>) -> Result<Vec<Screenshot>, ValidationError> {
    optional_list(map, "screenshots")?
        .iter()
        .enumerate()
        .map(|(index, item)| -> Result<Screenshot, ValidationError> {
            let url = str_field(item, "url")
                .ok_or(ValidationError::InvalidScreenshot { index, field: "url" })?;
            let caption = str_field(item, "caption").ok_or(ValidationError::InvalidScreenshot {
                index,
                field: "caption",
            })?;
            Ok(Screenshot {
                url: url.to_string(),
                caption: caption.to_string(),
            })
        })
        .collect()
}

fn tags(map: &Map<String, Value>) -> Result<Vec<String>, ValidationError> {
    optional_list(map, "tags")?
        .iter()
        .map(|tag| {
            tag.as_str()
                .map(str::to_string)
                .ok_or(ValidationError::WrongType {
                    field: "tags",
                    expected: "a list of strings",
                })
        })
        .collect()
}

fn alternative_versions(
    map: &Map<String, Value>,
) -> Result<Vec<AlternativeVersion>, ValidationError> {
    optional_list(map, "alternative_versions")?
        .iter()
        .enumerate()
        .map(|(index, item)| -> Result<AlternativeVersion, ValidationError> {
            let version =
                str_field(item, "version").ok_or(ValidationError::InvalidAlternativeVersion {
                    index,
                    field: "version",
                })?;
            let bundle_url = str_field(item, "bundle_url")
                .or_else(|| str_field(item, "appimage_url"))
                .ok_or(ValidationError::InvalidAlternativeVersion {
                    index,
                    field: "bundle_url",
                })?;
            let size = match item.get("size") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(_) => {
                    return Err(ValidationError::InvalidAlternativeVersion {
                        index,
                        field: "size",
                    });
                }
            };
            Ok(AlternativeVersion {
                version: version.to_string(),
                bundle_url: bundle_url.to_string(),
                size,
            })
        })
        .collect()
}
