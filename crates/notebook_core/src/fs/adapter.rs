//! Filesystem adapter contract and local-disk implementation.
//!
//! # Responsibility
//! - Provide list/create/delete/rename/read/write entry operations.
//! - Surface failures as `FsError` carrying the offending path.
//!
//! # Invariants
//! - `list_entries` returns entries in the order the OS yields them.
//! - `create_file` and `rename` never overwrite an existing entry.
//! - `create_directory` only tolerates an existing directory when
//!   `exists_ok` is requested by the caller.

use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Result type used by filesystem adapter operations.
pub type FsResult<T> = Result<T, FsError>;

/// Typed failure for one filesystem adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    /// Target (or source, for rename) does not exist.
    NotFound(PathBuf),
    /// OS refused access to the target.
    PermissionDenied(PathBuf),
    /// Target path is already occupied.
    AlreadyExists(PathBuf),
    /// Any other I/O failure.
    Io { path: PathBuf, detail: String },
}

impl FsError {
    /// Maps one `io::Error` raised while operating on `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(path),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            ErrorKind::AlreadyExists => Self::AlreadyExists(path),
            _ => Self::Io {
                path,
                detail: err.to_string(),
            },
        }
    }

    /// Path the failure refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(path)
            | Self::PermissionDenied(path)
            | Self::AlreadyExists(path)
            | Self::Io { path, .. } => path,
        }
    }

    /// Stable short code used in log lines and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::PermissionDenied(_) => "permission_denied",
            Self::AlreadyExists(_) => "already_exists",
            Self::Io { .. } => "io_error",
        }
    }
}

impl Display for FsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "path not found: {}", path.display()),
            Self::PermissionDenied(path) => {
                write!(f, "permission denied: {}", path.display())
            }
            Self::AlreadyExists(path) => write!(f, "path already exists: {}", path.display()),
            Self::Io { path, detail } => write!(f, "i/o error at {}: {detail}", path.display()),
        }
    }
}

impl Error for FsError {}

/// One directory entry as reported by `list_entries`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Final path segment.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_directory: bool,
}

/// Filesystem operations consumed by the tree model, the mutation
/// coordinator and the active-document tracker.
pub trait FsAdapter {
    /// Lists direct entries of one directory in OS order.
    fn list_entries(&self, path: &Path) -> FsResult<Vec<DirEntry>>;
    /// Creates one directory. Existing directories are accepted only with
    /// `exists_ok`; an existing non-directory is always `AlreadyExists`.
    fn create_directory(&self, path: &Path, exists_ok: bool) -> FsResult<()>;
    /// Creates one file with initial content; fails if `path` exists.
    fn create_file(&self, path: &Path, initial_content: &str) -> FsResult<()>;
    /// Reads one file as UTF-8 text.
    fn read_file(&self, path: &Path) -> FsResult<String>;
    /// Overwrites one file unconditionally.
    fn write_file(&self, path: &Path, content: &str) -> FsResult<()>;
    /// Deletes one file.
    fn delete_file(&self, path: &Path) -> FsResult<()>;
    /// Deletes one directory and everything below it.
    fn delete_directory_recursive(&self, path: &Path) -> FsResult<()>;
    /// Renames/moves one entry; fails if `new_path` is occupied.
    fn rename(&self, old_path: &Path, new_path: &Path) -> FsResult<()>;
}

impl<T: FsAdapter + ?Sized> FsAdapter for &T {
    fn list_entries(&self, path: &Path) -> FsResult<Vec<DirEntry>> {
        (**self).list_entries(path)
    }
    fn create_directory(&self, path: &Path, exists_ok: bool) -> FsResult<()> {
        (**self).create_directory(path, exists_ok)
    }
    fn create_file(&self, path: &Path, initial_content: &str) -> FsResult<()> {
        (**self).create_file(path, initial_content)
    }
    fn read_file(&self, path: &Path) -> FsResult<String> {
        (**self).read_file(path)
    }
    fn write_file(&self, path: &Path, content: &str) -> FsResult<()> {
        (**self).write_file(path, content)
    }
    fn delete_file(&self, path: &Path) -> FsResult<()> {
        (**self).delete_file(path)
    }
    fn delete_directory_recursive(&self, path: &Path) -> FsResult<()> {
        (**self).delete_directory_recursive(path)
    }
    fn rename(&self, old_path: &Path, new_path: &Path) -> FsResult<()> {
        (**self).rename(old_path, new_path)
    }
}

/// Adapter over the local disk via `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

impl FsAdapter for LocalFs {
    fn list_entries(&self, path: &Path) -> FsResult<Vec<DirEntry>> {
        let read_dir = fs::read_dir(path).map_err(|err| FsError::from_io(path, err))?;
        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|err| FsError::from_io(path, err))?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(
                        "event=fs_list module=fs status=skip reason=non_utf8_name parent={} name={:?}",
                        path.display(),
                        raw
                    );
                    continue;
                }
            };
            // Follows symlinks so a linked folder is navigable like a real one.
            let is_directory = entry.path().is_dir();
            entries.push(DirEntry { name, is_directory });
        }
        debug!(
            "event=fs_list module=fs status=ok path={} entries={}",
            path.display(),
            entries.len()
        );
        Ok(entries)
    }

    fn create_directory(&self, path: &Path, exists_ok: bool) -> FsResult<()> {
        match fs::symlink_metadata(path) {
            Ok(meta) if exists_ok && meta.is_dir() => return Ok(()),
            Ok(_) => return Err(FsError::AlreadyExists(path.to_path_buf())),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(FsError::from_io(path, err)),
        }
        fs::create_dir(path).map_err(|err| FsError::from_io(path, err))
    }

    fn create_file(&self, path: &Path, initial_content: &str) -> FsResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|err| FsError::from_io(path, err))?;
        file.write_all(initial_content.as_bytes())
            .map_err(|err| FsError::from_io(path, err))
    }

    fn read_file(&self, path: &Path) -> FsResult<String> {
        fs::read_to_string(path).map_err(|err| FsError::from_io(path, err))
    }

    fn write_file(&self, path: &Path, content: &str) -> FsResult<()> {
        fs::write(path, content).map_err(|err| FsError::from_io(path, err))
    }

    fn delete_file(&self, path: &Path) -> FsResult<()> {
        fs::remove_file(path).map_err(|err| FsError::from_io(path, err))
    }

    fn delete_directory_recursive(&self, path: &Path) -> FsResult<()> {
        fs::remove_dir_all(path).map_err(|err| FsError::from_io(path, err))
    }

    fn rename(&self, old_path: &Path, new_path: &Path) -> FsResult<()> {
        // `fs::rename` silently replaces files on unix, so occupancy is
        // checked up front.
        match fs::symlink_metadata(old_path) {
            Ok(_) => {}
            Err(err) => return Err(FsError::from_io(old_path, err)),
        }
        match fs::symlink_metadata(new_path) {
            Ok(_) => return Err(FsError::AlreadyExists(new_path.to_path_buf())),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(FsError::from_io(new_path, err)),
        }
        fs::rename(old_path, new_path).map_err(|err| FsError::from_io(old_path, err))
    }
}
