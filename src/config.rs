//! Optional `epub-upgrade.toml` settings.
//!
//! Every field has a default, so the file may be missing entirely or list only
//! the values a user wants to change. Command-line flags take precedence.

use crate::css::DEFAULT_MARGIN_PX;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "epub-upgrade.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Margin reduction in pixels.
    pub margin: i32,
    /// Folder that receives upgraded copies in folder mode.
    pub output_dir: PathBuf,
    /// Inserted before `.epub` when writing beside the original.
    pub suffix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN_PX,
            output_dir: PathBuf::from("books-upgrade"),
            suffix: "-upgrade".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults if it doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to load {} contents", path.display()))?;
        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        log::info!("loaded settings from {}", path.display());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join(SETTINGS_FILE)).expect("can load");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.margin, 20);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "margin = 12\n").unwrap();

        let settings = Settings::load(&path).expect("can load");
        assert_eq!(settings.margin, 12);
        assert_eq!(settings.output_dir, PathBuf::from("books-upgrade"));
        assert_eq!(settings.suffix, "-upgrade");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "margin = \"wide\"\n").unwrap();

        assert!(Settings::load(&path).is_err());
    }
}
