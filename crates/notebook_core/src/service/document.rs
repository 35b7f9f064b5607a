//! Active-document tracker.
//!
//! # Responsibility
//! - Bind at most one note to the editor buffer.
//! - Load on select, write on save, and follow renames/deletes of the
//!   bound path.
//!
//! # Invariants
//! - The binding is by path, never by tree node.
//! - Failed loads and saves leave the state untouched.
//! - Only `select` is valid while empty.

use crate::fs::{FsAdapter, FsError};
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Errors from active-document operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Operation needs a bound document.
    NoActiveDocument,
    /// Reading or writing the note failed.
    Fs(FsError),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoActiveDocument => write!(f, "no note is open"),
            Self::Fs(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fs(err) => Some(err),
            Self::NoActiveDocument => None,
        }
    }
}

impl From<FsError> for DocumentError {
    fn from(value: FsError) -> Self {
        Self::Fs(value)
    }
}

/// How a path affecting the bound document changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathChange {
    /// The path (and anything below it) is gone.
    Deleted,
    /// The path now lives at the carried location.
    Renamed(PathBuf),
}

/// Note bound to the editor buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundDocument {
    path: PathBuf,
    buffer: String,
    saved: String,
}

/// Tracker state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DocumentState {
    #[default]
    Empty,
    Bound(BoundDocument),
}

/// Serializable snapshot of the active document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentView {
    pub path: PathBuf,
    pub name: String,
    pub content: String,
    pub is_dirty: bool,
}

/// Tracks which note, if any, the editor buffer is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTracker {
    state: DocumentState,
}

impl DocumentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    /// Bound note path, if any.
    pub fn path(&self) -> Option<&Path> {
        match &self.state {
            DocumentState::Bound(doc) => Some(doc.path.as_path()),
            DocumentState::Empty => None,
        }
    }

    /// Current editor buffer, if bound.
    pub fn buffer(&self) -> Option<&str> {
        match &self.state {
            DocumentState::Bound(doc) => Some(doc.buffer.as_str()),
            DocumentState::Empty => None,
        }
    }

    /// Whether the buffer differs from the last loaded/saved content.
    pub fn is_dirty(&self) -> bool {
        match &self.state {
            DocumentState::Bound(doc) => doc.buffer != doc.saved,
            DocumentState::Empty => false,
        }
    }

    /// Loads `path` into the buffer and binds it.
    ///
    /// On read failure the previous binding (and its buffer) is kept.
    pub fn select<F: FsAdapter>(&mut self, fs: &F, path: &Path) -> Result<&str, DocumentError> {
        let content = match fs.read_file(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(
                    "event=document_select module=document status=error path={} error_code={}",
                    path.display(),
                    err.code()
                );
                return Err(err.into());
            }
        };
        info!(
            "event=document_select module=document status=ok path={} bytes={}",
            path.display(),
            content.len()
        );
        self.state = DocumentState::Bound(BoundDocument {
            path: path.to_path_buf(),
            buffer: content.clone(),
            saved: content,
        });
        Ok(self.buffer().unwrap_or_default())
    }

    /// Replaces the buffer text.
    pub fn set_buffer(&mut self, text: impl Into<String>) -> Result<(), DocumentError> {
        match &mut self.state {
            DocumentState::Bound(doc) => {
                doc.buffer = text.into();
                Ok(())
            }
            DocumentState::Empty => Err(DocumentError::NoActiveDocument),
        }
    }

    /// Writes the buffer to the bound path.
    ///
    /// A file deleted behind our back surfaces whatever the write reports.
    pub fn save<F: FsAdapter>(&mut self, fs: &F) -> Result<(), DocumentError> {
        let DocumentState::Bound(doc) = &mut self.state else {
            return Err(DocumentError::NoActiveDocument);
        };
        if let Err(err) = fs.write_file(&doc.path, &doc.buffer) {
            warn!(
                "event=document_save module=document status=error path={} error_code={}",
                doc.path.display(),
                err.code()
            );
            return Err(err.into());
        }
        doc.saved = doc.buffer.clone();
        info!(
            "event=document_save module=document status=ok path={} bytes={}",
            doc.path.display(),
            doc.buffer.len()
        );
        Ok(())
    }

    /// Reconciles the binding with a change to `affected`.
    ///
    /// Applies when the bound path equals `affected` or lies below it.
    /// Returns whether the binding changed.
    pub fn invalidate(&mut self, affected: &Path, change: &PathChange) -> bool {
        let DocumentState::Bound(doc) = &mut self.state else {
            return false;
        };
        let Ok(rest) = doc.path.strip_prefix(affected) else {
            return false;
        };

        match change {
            PathChange::Deleted => {
                info!(
                    "event=document_invalidate module=document status=ok action=clear path={} dirty={}",
                    doc.path.display(),
                    doc.buffer != doc.saved
                );
                self.state = DocumentState::Empty;
            }
            PathChange::Renamed(new_base) => {
                let new_path = if rest.as_os_str().is_empty() {
                    new_base.clone()
                } else {
                    new_base.join(rest)
                };
                info!(
                    "event=document_invalidate module=document status=ok action=rebind old={} new={}",
                    doc.path.display(),
                    new_path.display()
                );
                doc.path = new_path;
            }
        }
        true
    }

    /// Drops the binding and its buffer.
    pub fn clear(&mut self) {
        self.state = DocumentState::Empty;
    }

    /// Snapshot for the presentation layer.
    pub fn view(&self) -> Option<DocumentView> {
        match &self.state {
            DocumentState::Bound(doc) => Some(DocumentView {
                path: doc.path.clone(),
                name: doc
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                content: doc.buffer.clone(),
                is_dirty: doc.buffer != doc.saved,
            }),
            DocumentState::Empty => None,
        }
    }
}
