use super::errors::{io_at, ExtractError};
use super::writer::EntryWriter;
use std::io::Read;
use std::path::Path;
use tar::EntryType;

/// Unpack a tar stream entry by entry, in archive order.
pub(crate) fn unpack<R: Read>(
    reader: R,
    archive_path: &Path,
    writer: &mut EntryWriter<'_>,
) -> Result<(), ExtractError> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive.entries().map_err(io_at(archive_path))?;

    for entry in entries {
        let mut entry = entry.map_err(io_at(archive_path))?;
        let path = entry.path().map_err(io_at(archive_path))?.into_owned();
        let entry_type = entry.header().entry_type();
        let mode = entry.header().mode().ok();

        match entry_type {
            EntryType::Directory => writer.directory(&path, mode)?,
            EntryType::Regular | EntryType::Continuous => writer.file(&path, mode, &mut entry)?,
            EntryType::Symlink | EntryType::Link => {
                let link = entry
                    .link_name()
                    .map_err(io_at(archive_path))?
                    .ok_or_else(|| ExtractError::InvalidPath { path: path.clone() })?
                    .into_owned();
                if entry_type == EntryType::Symlink {
                    writer.symlink(&path, &link)?;
                } else {
                    writer.hard_link(&path, &link)?;
                }
            }
            EntryType::XGlobalHeader
            | EntryType::XHeader
            | EntryType::GNULongName
            | EntryType::GNULongLink => {
                tracing::trace!(path = %path.display(), "Ignoring tar metadata header");
            }
            other => {
                tracing::debug!(
                    path = %path.display(),
                    entry_type = ?other,
                    "Skipping unsupported tar entry"
                );
                writer.skipped(&path)?;
            }
        }
    }
    Ok(())
}
