//! The resolved configuration for one batch of upgrades.

use crate::css::{ModificationKind, DEFAULT_MARGIN_PX};
use derive_builder::Builder;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where upgraded archives get written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Into this folder, keeping the original file name.
    Folder(PathBuf),
    /// Replace the original file. No backup is kept.
    Overwrite,
    /// Beside the original, with this suffix inserted before the extension.
    Suffixed(String),
}

impl OutputMode {
    /// Destination path for `source` under this mode.
    pub fn destination(&self, source: &Path) -> PathBuf {
        match self {
            OutputMode::Folder(dir) => match source.file_name() {
                Some(name) => dir.join(name),
                None => dir.join(source),
            },
            OutputMode::Overwrite => source.to_path_buf(),
            OutputMode::Suffixed(suffix) => {
                let stem = source
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let name = match source.extension() {
                    Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
                    None => format!("{stem}{suffix}"),
                };
                source.with_file_name(name)
            }
        }
    }

    pub fn is_destructive(&self) -> bool {
        matches!(self, OutputMode::Overwrite)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Folder(dir) => write!(f, "into folder '{}'", dir.display()),
            OutputMode::Overwrite => write!(f, "overwrite original files"),
            OutputMode::Suffixed(suffix) => write!(f, "beside originals with '{suffix}' suffix"),
        }
    }
}

#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ModificationRequest {
    pub kind: ModificationKind,
    #[builder(default = "DEFAULT_MARGIN_PX")]
    pub margin_px: i32,
    pub output: OutputMode,
    #[builder(setter(each(name = "target", into)))]
    pub targets: Vec<PathBuf>,
}

impl ModificationRequestBuilder {
    fn validate(&self) -> Result<(), String> {
        match &self.targets {
            Some(targets) if targets.is_empty() => Err("no files to process".to_string()),
            _ => Ok(()),
        }
    }
}

impl ModificationRequest {
    /// The CSS appended to every archive in this request.
    pub fn fragment(&self) -> String {
        self.kind.fragment(self.margin_px)
    }

    pub fn describe(&self) -> String {
        self.kind.describe(self.margin_px)
    }
}
