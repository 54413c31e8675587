//! Errors raised while upgrading a single EPUB archive.
//!
//! These are the failures the batch loop catches and reports per file. Anything
//! fatal to the whole run (bad flags, unreadable settings) is reported through
//! `anyhow` at the application layer instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpgradeError {
    /// The source could not be opened as a ZIP container.
    #[error("'{}' is not a valid EPUB archive: {source}", path.display())]
    InvalidArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The archive opened but its entries could not be unpacked.
    #[error("failed to extract '{}': {source}", path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The stylesheet could not be created or appended to.
    #[error("failed to update stylesheet '{}': {source}", path.display())]
    Stylesheet {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The destination archive could not be written.
    #[error("failed to write '{}': {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A non-overwriting output mode resolved to the source file itself.
    #[error("'{}' would be written over itself; choose another output folder or --overwrite", path.display())]
    DestinationIsSource { path: PathBuf },
}

impl UpgradeError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        UpgradeError::WriteFailure {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type Result<T, E = UpgradeError> = std::result::Result<T, E>;
