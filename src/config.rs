//! Persisted user settings and XDG path resolution.
//!
//! Settings live in a sectioned `key = value` file:
//!
//! ```text
//! [Settings]
//! auto_refresh = true
//! last_tab = 0
//! last_category = all
//! update_interval = 24
//!
//! [Accessibility]
//! high_contrast = false
//! font_scale = 1.0
//!
//! [Appearance]
//! theme = system
//!
//! [Downloads]
//! install_dir = /home/me/.local/bin/AppImages
//! catalog_url = https://example.com/app.json
//! download_timeout_secs = 1800
//! connect_timeout_secs = 30
//! ```
//!
//! Missing keys take their defaults. Malformed values are logged and reset to
//! the default instead of failing the load.

use std::env;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::ALL_CATEGORIES;
use crate::download::constants::{CONNECT_TIMEOUT_SECS, DOWNLOAD_TIMEOUT_SECS};
use crate::fs_util::write_atomic;

const APP_DIR: &str = "bundleshop";

/// Catalog published by the upstream project.
pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/appimage-shop/app/refs/heads/main/app.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown setting `{key}`")]
    UnknownKey { key: String },

    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },
}

/// Color scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    /// Returns the stable string label used in the config file.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// All persisted settings with their defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub auto_refresh: bool,
    pub last_tab: u32,
    pub last_category: String,
    /// Hours between automatic catalog refreshes.
    pub update_interval: u32,
    pub high_contrast: bool,
    pub font_scale: f64,
    pub theme: Theme,
    pub install_dir: PathBuf,
    pub catalog_url: String,
    pub download_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            last_tab: 0,
            last_category: ALL_CATEGORIES.to_string(),
            update_interval: 24,
            high_contrast: false,
            font_scale: 1.0,
            theme: Theme::System,
            install_dir: default_install_dir().unwrap_or_else(|| PathBuf::from("AppImages")),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            download_timeout_secs: DOWNLOAD_TIMEOUT_SECS,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Loads settings from `path`; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                debug!(path = %path.display(), "loaded settings");
                Ok(parse_settings_str(&raw))
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Writes every setting to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Write`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        write_atomic(path, self.to_ini_string().as_bytes()).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Renders the settings in the on-disk format.
    #[must_use]
    pub fn to_ini_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[Settings]");
        let _ = writeln!(out, "auto_refresh = {}", self.auto_refresh);
        let _ = writeln!(out, "last_tab = {}", self.last_tab);
        let _ = writeln!(out, "last_category = {}", self.last_category);
        let _ = writeln!(out, "update_interval = {}", self.update_interval);
        let _ = writeln!(out);
        let _ = writeln!(out, "[Accessibility]");
        let _ = writeln!(out, "high_contrast = {}", self.high_contrast);
        let _ = writeln!(out, "font_scale = {:?}", self.font_scale);
        let _ = writeln!(out);
        let _ = writeln!(out, "[Appearance]");
        let _ = writeln!(out, "theme = {}", self.theme.as_str());
        let _ = writeln!(out);
        let _ = writeln!(out, "[Downloads]");
        let _ = writeln!(out, "install_dir = {}", self.install_dir.display());
        let _ = writeln!(out, "catalog_url = {}", self.catalog_url);
        let _ = writeln!(out, "download_timeout_secs = {}", self.download_timeout_secs);
        let _ = writeln!(out, "connect_timeout_secs = {}", self.connect_timeout_secs);
        out
    }

    /// Value of `key` rendered as in the file.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "auto_refresh" => self.auto_refresh.to_string(),
            "last_tab" => self.last_tab.to_string(),
            "last_category" => self.last_category.clone(),
            "update_interval" => self.update_interval.to_string(),
            "high_contrast" => self.high_contrast.to_string(),
            "font_scale" => format!("{:?}", self.font_scale),
            "theme" => self.theme.as_str().to_string(),
            "install_dir" => self.install_dir.display().to_string(),
            "catalog_url" => self.catalog_url.clone(),
            "download_timeout_secs" => self.download_timeout_secs.to_string(),
            "connect_timeout_secs" => self.connect_timeout_secs.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Sets one key from its textual form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] or [`ConfigError::InvalidValue`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        if apply_value(self, key, value.trim()) {
            Ok(())
        } else if self.get(key).is_none() {
            Err(ConfigError::UnknownKey {
                key: key.to_string(),
            })
        } else {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            })
        }
    }
}

/// Parses the settings file. Never fails: bad lines are logged and skipped,
/// bad values are reset to their defaults.
#[must_use]
pub fn parse_settings_str(raw: &str) -> Settings {
    let mut settings = Settings::default();
    let mut section = String::new();

    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = name.trim().to_string();
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            warn!(line = line_index + 1, "ignoring config line without key = value");
            continue;
        };
        let key = raw_key.trim();
        let value = raw_value.trim();

        if !key_in_section(&section, key) {
            warn!(section = %section, key, line = line_index + 1, "ignoring unknown config key");
            continue;
        }
        if !apply_value(&mut settings, key, value) {
            warn!(key, value, line = line_index + 1, "invalid config value, using default");
        }
    }

    settings
}

fn key_in_section(section: &str, key: &str) -> bool {
    let keys: &[&str] = match section {
        "Settings" => &["auto_refresh", "last_tab", "last_category", "update_interval"],
        "Accessibility" => &["high_contrast", "font_scale"],
        "Appearance" => &["theme"],
        "Downloads" => &[
            "install_dir",
            "catalog_url",
            "download_timeout_secs",
            "connect_timeout_secs",
        ],
        _ => &[],
    };
    keys.contains(&key)
}

/// Applies one value; returns false (leaving the field untouched) when the
/// key is unknown or the value is malformed.
fn apply_value(settings: &mut Settings, key: &str, value: &str) -> bool {
    let applied = match key {
        "auto_refresh" => parse_boolean(value).map(|v| settings.auto_refresh = v),
        "last_tab" => value.parse().ok().map(|v| settings.last_tab = v),
        "last_category" => non_empty(value).map(|v| settings.last_category = v),
        "update_interval" => parse_in_range(value, 1..=24 * 30).map(|v| settings.update_interval = v),
        "high_contrast" => parse_boolean(value).map(|v| settings.high_contrast = v),
        "font_scale" => value
            .parse::<f64>()
            .ok()
            .filter(|v| (0.5..=3.0).contains(v))
            .map(|v| settings.font_scale = v),
        "theme" => Theme::parse(value).map(|v| settings.theme = v),
        "install_dir" => non_empty(value).map(|v| settings.install_dir = expand_home(&v)),
        "catalog_url" => url::Url::parse(value)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .map(|_| settings.catalog_url = value.to_string()),
        "download_timeout_secs" => {
            parse_in_range(value, 1..=86_400).map(|v| settings.download_timeout_secs = v)
        }
        "connect_timeout_secs" => {
            parse_in_range(value, 1..=3600).map(|v| settings.connect_timeout_secs = v)
        }
        _ => None,
    };
    applied.is_some()
}

fn strip_inline_comment(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') || trimmed.starts_with(';') {
        return "";
    }
    let bytes = line.as_bytes();
    for (index, ch) in line.char_indices() {
        if matches!(ch, '#' | ';') && index > 0 && bytes[index - 1].is_ascii_whitespace() {
            return &line[..index];
        }
    }
    line
}

fn parse_boolean(raw_value: &str) -> Option<bool> {
    match raw_value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_in_range<T>(raw_value: &str, range: std::ops::RangeInclusive<T>) -> Option<T>
where
    T: std::str::FromStr + PartialOrd,
{
    raw_value.parse::<T>().ok().filter(|v| range.contains(v))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn expand_home(value: &str) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/")
        && let Some(home) = env_var_non_empty_os("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    PathBuf::from(value)
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

fn xdg_dir(xdg: Option<OsString>, home: Option<OsString>, fallback: &[&str]) -> Option<PathBuf> {
    if let Some(xdg) = xdg {
        return Some(PathBuf::from(xdg));
    }
    let mut path = PathBuf::from(home?);
    path.extend(fallback);
    Some(path)
}

/// Resolves the settings file path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/bundleshop/config.ini`
/// 2. `$HOME/.config/bundleshop/config.ini`
#[must_use]
pub fn resolve_config_path() -> Option<PathBuf> {
    xdg_dir(
        env_var_non_empty_os("XDG_CONFIG_HOME"),
        env_var_non_empty_os("HOME"),
        &[".config"],
    )
    .map(|dir| dir.join(APP_DIR).join("config.ini"))
}

/// `$XDG_DATA_HOME` or `$HOME/.local/share`.
#[must_use]
pub fn resolve_data_home() -> Option<PathBuf> {
    xdg_dir(
        env_var_non_empty_os("XDG_DATA_HOME"),
        env_var_non_empty_os("HOME"),
        &[".local", "share"],
    )
}

/// Directory for history, catalog cache and icons.
#[must_use]
pub fn resolve_data_dir() -> Option<PathBuf> {
    resolve_data_home().map(|dir| dir.join(APP_DIR))
}

/// Where desktop shortcut descriptors are written.
#[must_use]
pub fn resolve_applications_dir() -> Option<PathBuf> {
    resolve_data_home().map(|dir| dir.join("applications"))
}

/// `$HOME/.local/bin/AppImages`
#[must_use]
pub fn default_install_dir() -> Option<PathBuf> {
    let home = env_var_non_empty_os("HOME")?;
    Some(PathBuf::from(home).join(".local").join("bin").join("AppImages"))
}
