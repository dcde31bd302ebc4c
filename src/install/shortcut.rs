//! Desktop shortcut descriptors (`.desktop` files).
//!
//! The descriptor also records which version was installed, in the
//! `X-Bundle-Version=` key, so update detection survives restarts.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::layout::InstallLayout;
use crate::catalog::CatalogEntry;
use crate::fs_util::write_atomic;

/// Key carrying the installed version.
pub const VERSION_MARKER: &str = "X-Bundle-Version=";

/// Renders the descriptor for `entry` installed at `version`.
#[must_use]
pub fn render(entry: &CatalogEntry, layout: &InstallLayout, version: &str) -> String {
    format!(
        "[Desktop Entry]\n\
         Name={name}\n\
         Exec={exec}\n\
         Type=Application\n\
         Icon={icon}\n\
         Terminal=false\n\
         Categories={category};\n\
         Comment={comment}\n\
         {VERSION_MARKER}{version}\n",
        name = single_line(&entry.name),
        exec = layout.artifact_path(&entry.name).display(),
        icon = layout.icon_path(&entry.name).display(),
        category = single_line(&entry.category_key),
        comment = single_line(&entry.description),
    )
}

/// Writes the descriptor and returns its path.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn write(entry: &CatalogEntry, layout: &InstallLayout, version: &str) -> std::io::Result<PathBuf> {
    let path = layout.shortcut_path(&entry.name);
    write_atomic(&path, render(entry, layout, version).as_bytes())?;
    debug!(path = %path.display(), version, "wrote shortcut");
    Ok(path)
}

/// Reads the installed version from a descriptor.
///
/// `None` when the file is missing or carries no usable marker.
#[must_use]
pub fn read_version(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    contents
        .lines()
        .find_map(|line| line.trim().strip_prefix(VERSION_MARKER))
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .map(str::to_string)
}

fn single_line(value: &str) -> String {
    value.replace(['\n', '\r'], " ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry() -> CatalogEntry {
        CatalogEntry {
            name: "Foo".to_string(),
            description: "Line one\nline two".to_string(),
            category_key: "utilities".to_string(),
            version: "1.0".to_string(),
            ..CatalogEntry::default()
        }
    }

    #[test]
    fn test_render_layout() {
        let layout = InstallLayout::new("/b", "/apps", "/icons");
        let text = render(&entry(), &layout, "0.9");
        assert_eq!(
            text,
            "[Desktop Entry]\nName=Foo\nExec=/b/Foo.AppImage\nType=Application\n\
             Icon=/icons/Foo.png\nTerminal=false\nCategories=utilities;\n\
             Comment=Line one line two\nX-Bundle-Version=0.9\n"
        );
    }

    #[test]
    fn test_write_then_read_version() {
        let temp_dir = TempDir::new().unwrap();
        let layout = InstallLayout::under(temp_dir.path());
        let path = write(&entry(), &layout, "0.9").unwrap();
        assert_eq!(read_version(&path).as_deref(), Some("0.9"));
    }

    #[test]
    fn test_read_version_without_marker_or_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Foo.desktop");
        assert_eq!(read_version(&path), None);

        std::fs::write(&path, "[Desktop Entry]\nName=Foo\nX-Bundle-Version=\n").unwrap();
        assert_eq!(read_version(&path), None);
    }
}
