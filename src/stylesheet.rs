//! Locating (or creating) the stylesheet inside an unpacked EPUB.
//!
//! This is a path heuristic, not a manifest lookup: the first conventional
//! location that exists wins. A book whose stylesheet lives somewhere else gets
//! a fresh `OPS/style.css` that no content document links to, so the appended
//! rules have no effect on it.

use crate::error::{Result, UpgradeError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Conventional stylesheet locations, in search order.
pub const CANDIDATES: &[&str] = &[
    "OPS/style.css",
    "OEBPS/style.css",
    "styles/style.css",
    "css/style.css",
];

/// Contents of a stylesheet created because none of the candidates existed.
pub const PLACEHOLDER: &str = "/* Auto-generated stylesheet */\n";

/// A stylesheet resolved inside an extracted archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Entry name within the archive (forward slashes).
    pub entry: String,
    /// True if the file did not exist and was created with [`PLACEHOLDER`].
    pub created: bool,
}

/// Find the first conventional stylesheet under `root`.
pub fn locate(root: &Path) -> Option<(PathBuf, &'static str)> {
    CANDIDATES
        .iter()
        .map(|candidate| (root.join(candidate), *candidate))
        .find(|(path, _)| path.is_file())
}

/// Find the stylesheet under `root`, creating a placeholder at the first
/// candidate location if none exists.
pub fn locate_or_create(root: &Path) -> Result<Stylesheet> {
    if let Some((path, entry)) = locate(root) {
        log::debug!("found stylesheet at {entry}");
        return Ok(Stylesheet {
            path,
            entry: entry.to_string(),
            created: false,
        });
    }

    let entry = CANDIDATES[0];
    let path = root.join(entry);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| UpgradeError::Stylesheet {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(&path, PLACEHOLDER).map_err(|source| UpgradeError::Stylesheet {
        path: path.clone(),
        source,
    })?;
    log::warn!("no stylesheet found, created {entry}");

    Ok(Stylesheet {
        path,
        entry: entry.to_string(),
        created: true,
    })
}

/// Append `fragment` verbatim to the end of the stylesheet.
pub fn append(stylesheet: &Stylesheet, fragment: &str) -> Result<()> {
    let map_err = |source| UpgradeError::Stylesheet {
        path: stylesheet.path.clone(),
        source,
    };
    let mut file = OpenOptions::new()
        .append(true)
        .open(&stylesheet.path)
        .map_err(map_err)?;
    file.write_all(fragment.as_bytes()).map_err(map_err)?;
    file.flush().map_err(map_err)
}
