//! Zip archives mounted as read-only views on rule files.

use crate::error::ResolutionError;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// File extension identifying rule archives.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// An opened zip archive whose entries can be listed like a directory tree.
pub struct MountedArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl MountedArchive {
    fn open(path: &Path) -> Result<Self, ResolutionError> {
        let file = File::open(path).map_err(|e| ResolutionError::mount(path, e))?;
        let archive = ZipArchive::new(file).map_err(|e| ResolutionError::mount(path, e))?;
        Ok(Self {
            path: path.to_owned(),
            archive,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lists the files directly inside `dir`, sorted by name.
    ///
    /// `dir` is a `/`-separated path relative to the archive root, the empty string being the root.
    /// Hidden entries (starting with a dot) are skipped.
    pub fn list(&self, dir: &str) -> Result<Vec<String>, ResolutionError> {
        let dir = dir.trim_matches('/');
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        if !dir.is_empty() {
            if self.archive.file_names().any(|name| name == dir) {
                return Err(ResolutionError::NotADirectory {
                    path: self.path.join(dir),
                });
            }
            if !self
                .archive
                .file_names()
                .any(|name| name.starts_with(&prefix))
            {
                return Err(ResolutionError::NotFound {
                    path: self.path.join(dir),
                });
            }
        }
        let mut entries = self
            .archive
            .file_names()
            .filter(|name| {
                name.strip_prefix(&prefix).is_some_and(|child| {
                    !child.is_empty() && !child.contains('/') && !child.starts_with('.')
                })
            })
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>();
        entries.sort_unstable();
        Ok(entries)
    }

    /// Reads the full text of an entry.
    pub fn read_to_string(&mut self, entry: &str) -> Result<String, ResolutionError> {
        let mut file = self.archive.by_name(entry).map_err(|e| {
            ResolutionError::read(
                entry,
                std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
            )
        })?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .map_err(|e| ResolutionError::read(entry, e))?;
        String::from_utf8(buffer).map_err(|_| ResolutionError::NotUtf8 {
            entry: entry.to_owned(),
        })
    }
}

/// Registry of the archives mounted during a validation run.
///
/// Mounting is idempotent: an archive is opened once and the same view is returned afterwards.
/// All the views are released by [`release`](Self::release) or when the registry is dropped.
#[derive(Default)]
pub struct ArchiveMounts {
    mounts: HashMap<PathBuf, MountedArchive>,
}

impl ArchiveMounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts the archive at `path`, or returns the existing view if it is already mounted.
    pub fn mount(&mut self, path: &Path) -> Result<&mut MountedArchive, ResolutionError> {
        let key = fs::canonicalize(path).map_err(|e| ResolutionError::mount(path, e))?;
        match self.mounts.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let archive = MountedArchive::open(entry.key())?;
                debug!("Mounted archive {}", entry.key().display());
                Ok(entry.insert(archive))
            }
        }
    }

    /// Number of archives currently mounted.
    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Releases every mounted archive.
    pub fn release(&mut self) {
        for (path, _) in self.mounts.drain() {
            debug!("Released archive {}", path.display());
        }
    }
}

impl Drop for ArchiveMounts {
    fn drop(&mut self) {
        self.release();
    }
}
