//! Archive extraction with exact permissions and per-entry progress.
//!
//! Supports gzip-compressed tar, plain tar and zip. Every entry is written
//! below the destination directory with the permission bits stored in the
//! archive, regardless of the process umask, and one progress message per
//! entry goes to the listener.
//!
//! # Example
//!
//! ```rust,no_run
//! use managed_sdk::{Extractor, TracingListener};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), managed_sdk::ExtractError> {
//! let report = Extractor::new(
//!     "/tmp/google-cloud-sdk.tar.gz",
//!     "/opt/sdk",
//!     Arc::new(TracingListener),
//! )
//! .extract()
//! .await?;
//! println!("{} entries", report.entries.len());
//! # Ok(())
//! # }
//! ```

mod errors;
mod format;
mod tar_reader;
mod writer;
mod zip_reader;

pub use errors::ExtractError;
pub use format::ArchiveFormat;

use crate::MessageListener;
use errors::io_at;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use writer::EntryWriter;

/// Kind of filesystem object an entry produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum EntryKind {
    /// A regular file with its contents.
    File,
    /// A directory.
    Directory,
    /// A symbolic link (tar, Unix only).
    Symlink,
    /// A hard link to an earlier entry (tar only).
    HardLink,
    /// An entry that was reported but not written, such as a fifo, a
    /// device node, or a symlink on a platform without symlink support.
    Skipped,
}

/// One processed archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntry {
    /// Where the entry was written.
    pub path: PathBuf,
    /// What was created at `path`.
    pub kind: EntryKind,
    /// Permission bits from the archive, if it stored any.
    pub mode: Option<u32>,
}

/// Result of a completed extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Format the archive was read as.
    pub format: ArchiveFormat,
    /// Entries in archive order. Duplicates appear once per occurrence.
    pub entries: Vec<ExtractedEntry>,
}

/// Extract `archive` into `destination`, blocking the current thread.
///
/// The destination is created if missing. The format is chosen from the
/// archive's file name. Each processed entry sends
/// `"<destination>/<entry path>\n"` to `listener`, in archive order.
///
/// # Errors
///
/// - [`ExtractError::UnsupportedFormat`] when the file name has no known extension
/// - [`ExtractError::InvalidPath`] when an entry is absolute, contains `..`,
///   or would land outside the destination through a link
/// - [`ExtractError::Io`] / [`ExtractError::Zip`] when reading or writing fails
pub fn extract_archive(
    archive: &Path,
    destination: &Path,
    listener: &dyn MessageListener,
) -> Result<ExtractionReport, ExtractError> {
    let format =
        ArchiveFormat::from_path(archive).ok_or_else(|| ExtractError::UnsupportedFormat {
            path: archive.to_path_buf(),
        })?;

    tracing::debug!(
        archive = %archive.display(),
        destination = %destination.display(),
        ?format,
        "Extracting archive"
    );

    fs::create_dir_all(destination).map_err(io_at(destination))?;
    let file = File::open(archive).map_err(io_at(archive))?;

    let mut writer = EntryWriter::new(destination, listener)?;
    match format {
        ArchiveFormat::TarGz => {
            tar_reader::unpack(GzDecoder::new(BufReader::new(file)), archive, &mut writer)?
        }
        ArchiveFormat::Tar => tar_reader::unpack(BufReader::new(file), archive, &mut writer)?,
        ArchiveFormat::Zip => zip_reader::unpack(BufReader::new(file), &mut writer)?,
    }
    let entries = writer.finish()?;

    tracing::info!(
        archive = %archive.display(),
        entries = entries.len(),
        "Extracted archive"
    );
    Ok(ExtractionReport { format, entries })
}

/// One-shot asynchronous extraction.
///
/// The work runs on the blocking thread pool; listener messages are
/// delivered from that thread. `extract` consumes the extractor, so each
/// instance runs at most once.
pub struct Extractor {
    archive: PathBuf,
    destination: PathBuf,
    listener: Arc<dyn MessageListener>,
}

impl Extractor {
    /// Prepare extraction of `archive` into `destination`, reporting each
    /// entry to `listener`. Nothing is read until [`extract`](Self::extract).
    pub fn new(
        archive: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        listener: Arc<dyn MessageListener>,
    ) -> Self {
        Self {
            archive: archive.into(),
            destination: destination.into(),
            listener,
        }
    }

    /// The archive to extract.
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// The directory entries are written below.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Run the extraction. See [`extract_archive`].
    pub async fn extract(self) -> Result<ExtractionReport, ExtractError> {
        tokio::task::spawn_blocking(move || {
            extract_archive(&self.archive, &self.destination, self.listener.as_ref())
        })
        .await?
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("archive", &self.archive)
            .field("destination", &self.destination)
            .finish_non_exhaustive()
    }
}
