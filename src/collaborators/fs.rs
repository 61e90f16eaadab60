//! SH-010: Filesystem collaborator.
//!
//! Operations never touch the disk directly; they go through `Filesystem`,
//! which reports not-found, permission-denied, and already-exists as
//! distinct errors so the executor can tell advisory from fatal outcomes.

use super::archive::{self, ArchiveFormat};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Classified filesystem failure.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("unsupported archive format: {}", .0.display())]
    Unsupported(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Classify an I/O error against the path it concerns.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Filesystem operations available to install steps.
pub trait Filesystem {
    fn exists(&self, path: &Path) -> bool;

    /// Move `src` to `dst`. An existing directory `dst` receives `src` inside it.
    fn move_path(&self, src: &Path, dst: &Path) -> Result<(), FsError>;

    /// Copy `src` into `dst`, merging directories and overwriting files.
    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<(), FsError>;

    /// Create a directory and its parents. Fails with `AlreadyExists` when present.
    fn create_dir(&self, path: &Path) -> Result<(), FsError>;

    fn extract(&self, archive: &Path, dst: &Path, format: ArchiveFormat) -> Result<(), FsError>;

    fn open(&self, path: &Path) -> Result<Box<dyn Read>, FsError>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn move_path(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        if !src.exists() {
            return Err(FsError::NotFound(src.to_path_buf()));
        }
        let target = if dst.is_dir() {
            match src.file_name() {
                Some(name) => dst.join(name),
                None => return Err(FsError::NotFound(src.to_path_buf())),
            }
        } else {
            dst.to_path_buf()
        };
        if target.exists() {
            return Err(FsError::AlreadyExists(target));
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FsError::from_io(parent, e))?;
        }

        debug!(src = %src.display(), dst = %target.display(), "rename");
        match std::fs::rename(src, &target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                // Different filesystems: copy, then remove the source
                copy_recursive(src, &target)?;
                remove_path(src)
            }
            Err(e) => Err(FsError::from_io(src, e)),
        }
    }

    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        if !src.exists() {
            return Err(FsError::NotFound(src.to_path_buf()));
        }
        let target = if src.is_file() && dst.is_dir() {
            match src.file_name() {
                Some(name) => dst.join(name),
                None => dst.to_path_buf(),
            }
        } else {
            dst.to_path_buf()
        };
        copy_recursive(src, &target)
    }

    fn create_dir(&self, path: &Path) -> Result<(), FsError> {
        if path.exists() {
            return Err(FsError::AlreadyExists(path.to_path_buf()));
        }
        std::fs::create_dir_all(path).map_err(|e| FsError::from_io(path, e))
    }

    fn extract(&self, archive: &Path, dst: &Path, format: ArchiveFormat) -> Result<(), FsError> {
        if !archive.exists() {
            return Err(FsError::NotFound(archive.to_path_buf()));
        }
        std::fs::create_dir_all(dst).map_err(|e| FsError::from_io(dst, e))?;
        archive::unpack(archive, dst, format)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Read>, FsError> {
        let file = std::fs::File::open(path).map_err(|e| FsError::from_io(path, e))?;
        Ok(Box::new(file))
    }
}

fn copy_recursive(src: &Path, dst: &Path) -> Result<(), FsError> {
    if src.is_dir() {
        std::fs::create_dir_all(dst).map_err(|e| FsError::from_io(dst, e))?;
        let entries = std::fs::read_dir(src).map_err(|e| FsError::from_io(src, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| FsError::from_io(src, e))?;
            copy_recursive(&entry.path(), &dst.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FsError::from_io(parent, e))?;
        }
        std::fs::copy(src, dst)
            .map(|_| ())
            .map_err(|e| FsError::from_io(src, e))
    }
}

fn remove_path(path: &Path) -> Result<(), FsError> {
    let result = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| FsError::from_io(path, e))
}
