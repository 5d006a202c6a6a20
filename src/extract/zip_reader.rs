use super::errors::ExtractError;
use super::writer::EntryWriter;
use std::io::{Read, Seek};
use std::path::PathBuf;

/// Unpack every zip entry in central-directory order.
///
/// Modes come from the Unix external attributes; entries written on other
/// systems carry none and keep the platform default.
pub(crate) fn unpack<R: Read + Seek>(
    reader: R,
    writer: &mut EntryWriter<'_>,
) -> Result<(), ExtractError> {
    let mut archive = zip::ZipArchive::new(reader)?;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let path = PathBuf::from(file.name());
        let mode = file.unix_mode();

        if file.is_dir() {
            writer.directory(&path, mode)?;
        } else {
            writer.file(&path, mode, &mut file)?;
        }
    }
    Ok(())
}
