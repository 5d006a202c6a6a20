//! Writes archive entries into the destination directory.
//!
//! Both archive readers hand their entries to an [`EntryWriter`], which owns
//! path sanitization, permission handling and progress messages. Directory
//! modes are applied last, deepest first, so a read-only directory never
//! blocks writing its own children.
//!
//! Every write is checked against what is already on disk: the nearest
//! existing ancestor of the path must canonicalize to somewhere inside the
//! destination, so links created by earlier entries cannot redirect later
//! ones outside it.

use super::errors::{io_at, ExtractError};
use super::{EntryKind, ExtractedEntry};
use crate::MessageListener;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

pub(crate) struct EntryWriter<'a> {
    destination: &'a Path,
    /// Canonical form of `destination`.
    root: PathBuf,
    listener: &'a dyn MessageListener,
    directory_modes: BTreeMap<PathBuf, u32>,
    entries: Vec<ExtractedEntry>,
}

impl<'a> EntryWriter<'a> {
    /// `destination` must already exist.
    pub(crate) fn new(
        destination: &'a Path,
        listener: &'a dyn MessageListener,
    ) -> Result<Self, ExtractError> {
        let root = fs::canonicalize(destination).map_err(io_at(destination))?;
        Ok(Self {
            destination,
            root,
            listener,
            directory_modes: BTreeMap::new(),
            entries: Vec::new(),
        })
    }

    pub(crate) fn directory(&mut self, raw: &Path, mode: Option<u32>) -> Result<(), ExtractError> {
        let relative = normalize(raw)?;
        if relative.as_os_str().is_empty() {
            tracing::trace!(path = %raw.display(), "Skipping entry for the destination itself");
            return Ok(());
        }
        let target = self.destination.join(relative);
        self.ensure_inside(&target)?;
        fs::create_dir_all(&target).map_err(io_at(&target))?;
        if let Some(mode) = mode {
            self.directory_modes.insert(target.clone(), mode & 0o777);
        }
        self.record(target, EntryKind::Directory, mode);
        Ok(())
    }

    pub(crate) fn file(
        &mut self,
        raw: &Path,
        mode: Option<u32>,
        contents: &mut dyn Read,
    ) -> Result<(), ExtractError> {
        let target = self.resolve_child(raw)?;
        self.prepare_parent(&target)?;
        remove_existing(&target)?;

        let mut file = File::create(&target).map_err(io_at(&target))?;
        io::copy(contents, &mut file).map_err(io_at(&target))?;
        drop(file);

        if let Some(mode) = mode {
            set_mode(&target, mode).map_err(io_at(&target))?;
        }
        self.record(target, EntryKind::File, mode);
        Ok(())
    }

    pub(crate) fn symlink(&mut self, raw: &Path, link_target: &Path) -> Result<(), ExtractError> {
        let target = self.resolve_child(raw)?;
        let parent = self.prepare_parent(&target)?;

        let canonical_parent = fs::canonicalize(&parent).map_err(io_at(&parent))?;
        let resolved = resolve_on_disk(&canonical_parent, link_target).map_err(io_at(&target))?;
        if !resolved.is_some_and(|resolved| resolved.starts_with(&self.root)) {
            return Err(ExtractError::InvalidPath {
                path: link_target.to_path_buf(),
            });
        }

        remove_existing(&target)?;
        let kind = create_symlink(link_target, &target)?;
        self.record(target, kind, None);
        Ok(())
    }

    pub(crate) fn hard_link(&mut self, raw: &Path, link_source: &Path) -> Result<(), ExtractError> {
        let target = self.resolve_child(raw)?;
        let source = self.resolve_child(link_source)?;
        self.ensure_inside(&source)?;
        self.prepare_parent(&target)?;
        remove_existing(&target)?;
        fs::hard_link(&source, &target).map_err(io_at(&target))?;
        self.record(target, EntryKind::HardLink, None);
        Ok(())
    }

    /// Report an entry that is not materialized, such as a device node or fifo.
    pub(crate) fn skipped(&mut self, raw: &Path) -> Result<(), ExtractError> {
        let target = self.resolve_child(raw)?;
        self.record(target, EntryKind::Skipped, None);
        Ok(())
    }

    /// Apply the deferred directory modes and return the processed entries.
    pub(crate) fn finish(self) -> Result<Vec<ExtractedEntry>, ExtractError> {
        for (directory, mode) in self.directory_modes.iter().rev() {
            set_mode(directory, *mode).map_err(io_at(directory))?;
        }
        Ok(self.entries)
    }

    /// Destination path of an entry that must name something below it.
    fn resolve_child(&self, raw: &Path) -> Result<PathBuf, ExtractError> {
        let relative = normalize(raw)?;
        if relative.as_os_str().is_empty() {
            return Err(ExtractError::InvalidPath {
                path: raw.to_path_buf(),
            });
        }
        Ok(self.destination.join(relative))
    }

    /// Check `target`'s parent, then create it. Returns the parent.
    fn prepare_parent(&self, target: &Path) -> Result<PathBuf, ExtractError> {
        let parent = target.parent().unwrap_or(self.destination).to_path_buf();
        self.ensure_inside(&parent)?;
        fs::create_dir_all(&parent).map_err(io_at(&parent))?;
        Ok(parent)
    }

    /// Fail unless the nearest existing ancestor of `path` (or `path` itself)
    /// resolves inside the destination.
    fn ensure_inside(&self, path: &Path) -> Result<(), ExtractError> {
        let mut candidate = Some(path);
        while let Some(current) = candidate {
            match fs::canonicalize(current) {
                Ok(resolved) if resolved.starts_with(&self.root) => return Ok(()),
                Ok(resolved) => {
                    tracing::warn!(
                        path = %path.display(),
                        resolved = %resolved.display(),
                        "Archive entry resolves outside the destination"
                    );
                    return Err(ExtractError::InvalidPath {
                        path: path.to_path_buf(),
                    });
                }
                Err(error) if error.kind() == io::ErrorKind::NotFound => {
                    candidate = current.parent();
                }
                Err(error) => return Err(io_at(current)(error)),
            }
        }
        Ok(())
    }

    fn record(&mut self, path: PathBuf, kind: EntryKind, mode: Option<u32>) {
        tracing::trace!(path = %path.display(), ?kind, "Extracted entry");
        self.listener.message(&format!("{}\n", path.display()));
        self.entries.push(ExtractedEntry {
            path,
            kind,
            mode: mode.map(|mode| mode & 0o777),
        });
    }
}

/// Strip `.` components and reject anything that could leave the destination.
fn normalize(raw: &Path) -> Result<PathBuf, ExtractError> {
    let mut relative = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExtractError::InvalidPath {
                    path: raw.to_path_buf(),
                });
            }
        }
    }
    Ok(relative)
}

/// Resolve a relative link `target` from the canonical directory `base`,
/// following links that already exist at each step. `None` for absolute
/// targets.
fn resolve_on_disk(base: &Path, target: &Path) -> io::Result<Option<PathBuf>> {
    let mut resolved = base.to_path_buf();
    for component in target.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => {
                resolved.push(part);
                match fs::canonicalize(&resolved) {
                    Ok(canonical) => resolved = canonical,
                    Err(error) if error.kind() == io::ErrorKind::NotFound => {}
                    Err(error) => return Err(error),
                }
            }
            Component::RootDir | Component::Prefix(_) => return Ok(None),
        }
    }
    Ok(Some(resolved))
}

/// Remove a file or link at `target` so the entry replaces it.
fn remove_existing(target: &Path) -> Result<(), ExtractError> {
    match fs::symlink_metadata(target) {
        Ok(metadata) if !metadata.is_dir() => fs::remove_file(target).map_err(io_at(target)),
        Ok(_) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(io_at(target)(error)),
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions)
}

#[cfg(unix)]
fn create_symlink(link_target: &Path, target: &Path) -> Result<EntryKind, ExtractError> {
    std::os::unix::fs::symlink(link_target, target).map_err(io_at(target))?;
    Ok(EntryKind::Symlink)
}

#[cfg(not(unix))]
fn create_symlink(link_target: &Path, target: &Path) -> Result<EntryKind, ExtractError> {
    tracing::warn!(
        link = %target.display(),
        target = %link_target.display(),
        "Symbolic links are not supported on this platform, skipping"
    );
    Ok(EntryKind::Skipped)
}
