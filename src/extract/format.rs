//! Supported archive formats.

use serde::{Deserialize, Serialize};
use std::path::Path;
use strum::IntoEnumIterator;

/// Archive container formats the extractor understands.
///
/// # Example
///
/// ```rust
/// use managed_sdk::ArchiveFormat;
/// use std::path::Path;
///
/// assert_eq!(
///     ArchiveFormat::from_path(Path::new("sdk-linux-x86_64.tar.gz")),
///     Some(ArchiveFormat::TarGz)
/// );
/// assert_eq!(
///     ArchiveFormat::from_path(Path::new("sdk-windows.zip")),
///     Some(ArchiveFormat::Zip)
/// );
/// assert_eq!(ArchiveFormat::from_path(Path::new("sdk.rar")), None);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter,
)]
#[non_exhaustive]
pub enum ArchiveFormat {
    /// Gzip-compressed tar (`.tar.gz`, `.tgz`).
    TarGz,
    /// Uncompressed tar (`.tar`).
    Tar,
    /// Zip (`.zip`).
    Zip,
}

impl ArchiveFormat {
    /// File name suffixes recognized for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::TarGz => &[".tar.gz", ".tgz"],
            Self::Tar => &[".tar"],
            Self::Zip => &[".zip"],
        }
    }

    /// Detect the format from an archive's file name (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        Self::all().find(|format| {
            format
                .extensions()
                .iter()
                .any(|extension| name.ends_with(extension))
        })
    }

    /// Iterator over all supported formats.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }
}
