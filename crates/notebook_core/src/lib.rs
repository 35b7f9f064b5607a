//! Core of the notebook: a filesystem-backed folder/note tree, the
//! mutations that keep it in step with disk, and the active editor document.
//! This crate is the single source of truth for tree/disk consistency.

pub mod app;
pub mod config;
pub mod error;
pub mod fs;
pub mod logging;
pub mod model;
pub mod preview;
pub mod service;

pub use app::{Notebook, UnsavedPolicy};
pub use config::{ConfigError, NotebookConfig};
pub use error::{NotebookError, NotebookResult};
pub use fs::{DirEntry, FsAdapter, FsError, FsResult, LocalFs};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::tree::{NodeKind, NodeView, TreeError, TreeModel, TreeNode, TreeResult};
pub use preview::{
    CommonMarkRenderer, MarkdownRenderer, PreviewError, PreviewViewer, SystemViewer,
};
pub use service::document::{DocumentError, DocumentState, DocumentTracker, DocumentView, PathChange};
pub use service::mutation::MutationCoordinator;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
