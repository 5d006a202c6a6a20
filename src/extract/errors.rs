//! Error types for archive extraction.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while extracting an archive.
///
/// Extraction stops at the first error and leaves whatever was already
/// written in the destination.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The archive's file name does not match a supported format.
    #[error("unsupported archive format: {}", path.display())]
    UnsupportedFormat {
        /// The archive path.
        path: PathBuf,
    },

    /// An entry path is absolute or escapes the destination.
    #[error("archive entry has an unsafe path: {}", path.display())]
    InvalidPath {
        /// The path as stored in the archive.
        path: PathBuf,
    },

    /// Reading the archive or writing an entry failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The archive or destination path involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The zip archive is malformed.
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The blocking extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Attach `path` to an I/O error.
pub(crate) fn io_at(path: &Path) -> impl FnOnce(io::Error) -> ExtractError + '_ {
    move |source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    }
}
