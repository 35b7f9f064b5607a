//! Notebook-level error taxonomy.
//!
//! # Responsibility
//! - Unify adapter, tree, tracker, config and preview failures for the
//!   presentation boundary.
//!
//! # Invariants
//! - Filesystem failures pass through unchanged as `Fs(FsError)`.
//! - Every variant maps to a stable `code()` for UI/FFI envelopes.

use crate::config::ConfigError;
use crate::fs::FsError;
use crate::model::tree::TreeError;
use crate::preview::PreviewError;
use crate::service::document::DocumentError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Result type used by notebook operations.
pub type NotebookResult<T> = Result<T, NotebookError>;

/// Errors surfaced by the mutation coordinator and the UI boundary.
#[derive(Debug)]
pub enum NotebookError {
    /// Name is blank or not a legal single path segment.
    InvalidName(String),
    /// No tree node is known at this path.
    NodeNotFound(PathBuf),
    /// Operation needs a folder node.
    NodeMustBeFolder(PathBuf),
    /// Operation needs a note node.
    NodeMustBeNote(PathBuf),
    /// The model already holds a node at the target path.
    NodeExists(PathBuf),
    /// Operation needs an open note.
    NoActiveDocument,
    /// Active document has unsaved edits the caller did not discard.
    UnsavedChanges(PathBuf),
    /// Move target is the node itself, one of its descendants, or the node
    /// is a root.
    InvalidMove { node: PathBuf, target: PathBuf },
    /// Chosen root lies inside, or contains, an already attached root.
    OverlappingRoot { path: PathBuf, root: PathBuf },
    /// Configuration could not be loaded.
    Config(ConfigError),
    /// Preview rendering or hand-off failed.
    Preview(PreviewError),
    /// Filesystem adapter failure.
    Fs(FsError),
}

impl NotebookError {
    /// Stable short code for log lines and presentation envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidName(_) => "invalid_name",
            Self::NodeNotFound(_) => "node_not_found",
            Self::NodeMustBeFolder(_) => "node_must_be_folder",
            Self::NodeMustBeNote(_) => "node_must_be_note",
            Self::NodeExists(_) => "node_exists",
            Self::NoActiveDocument => "no_active_document",
            Self::UnsavedChanges(_) => "unsaved_changes",
            Self::InvalidMove { .. } => "invalid_move",
            Self::OverlappingRoot { .. } => "overlapping_root",
            Self::Config(_) => "config_error",
            Self::Preview(_) => "preview_error",
            Self::Fs(err) => err.code(),
        }
    }
}

impl Display for NotebookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid name: `{name}`"),
            Self::NodeNotFound(path) => write!(f, "node not found: {}", path.display()),
            Self::NodeMustBeFolder(path) => write!(f, "not a folder: {}", path.display()),
            Self::NodeMustBeNote(path) => write!(f, "not a note: {}", path.display()),
            Self::NodeExists(path) => write!(f, "node already exists: {}", path.display()),
            Self::NoActiveDocument => write!(f, "no note is open"),
            Self::UnsavedChanges(path) => {
                write!(f, "unsaved changes in {}", path.display())
            }
            Self::InvalidMove { node, target } => write!(
                f,
                "cannot move {} into {}",
                node.display(),
                target.display()
            ),
            Self::OverlappingRoot { path, root } => write!(
                f,
                "{} overlaps the open folder {}",
                path.display(),
                root.display()
            ),
            Self::Config(err) => write!(f, "{err}"),
            Self::Preview(err) => write!(f, "{err}"),
            Self::Fs(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotebookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Preview(err) => Some(err),
            Self::Fs(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FsError> for NotebookError {
    fn from(value: FsError) -> Self {
        Self::Fs(value)
    }
}

impl From<TreeError> for NotebookError {
    fn from(value: TreeError) -> Self {
        match value {
            TreeError::NodeNotFound(path) => Self::NodeNotFound(path),
            TreeError::NodeMustBeFolder(path) => Self::NodeMustBeFolder(path),
            TreeError::NodeExists(path) => Self::NodeExists(path),
            TreeError::OverlappingRoot { path, root } => Self::OverlappingRoot { path, root },
            TreeError::Fs(err) => Self::Fs(err),
        }
    }
}

impl From<DocumentError> for NotebookError {
    fn from(value: DocumentError) -> Self {
        match value {
            DocumentError::NoActiveDocument => Self::NoActiveDocument,
            DocumentError::Fs(err) => Self::Fs(err),
        }
    }
}

impl From<ConfigError> for NotebookError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<PreviewError> for NotebookError {
    fn from(value: PreviewError) -> Self {
        Self::Preview(value)
    }
}
