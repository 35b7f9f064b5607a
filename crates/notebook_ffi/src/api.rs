//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the notebook presentation boundary to Dart via FRB.
//! - Flatten core results into plain envelopes the UI can render.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures carry a stable `error_code` plus a readable message.
//! - Session state lives in an opaque object owned by the caller, not in
//!   process globals.

use log::warn;
use notebook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, DocumentView,
    LocalFs, NodeKind, NodeView, Notebook, NotebookConfig, NotebookError,
};
use std::path::Path;

/// Minimal version probe.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.trim()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Tree node as rendered by the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub path: String,
    pub name: String,
    /// `folder|note`.
    pub kind: String,
    pub children_loaded: bool,
    pub children: Vec<TreeItem>,
}

/// Result envelope for tree-changing calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeResponse {
    pub ok: bool,
    /// Affected subtree; `None` on failure or when a root was removed.
    pub item: Option<TreeItem>,
    pub error_code: Option<String>,
    pub message: String,
}

/// Result envelope for editor calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResponse {
    pub ok: bool,
    pub path: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_dirty: bool,
    pub error_code: Option<String>,
    pub message: String,
}

/// Result envelope for preview calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewResponse {
    pub ok: bool,
    /// Temporary HTML file handed to the viewer.
    pub html_path: Option<String>,
    pub error_code: Option<String>,
    pub message: String,
}

/// One notebook session bound to the local disk.
#[flutter_rust_bridge::frb(opaque)]
pub struct NotebookSession {
    notebook: Notebook<LocalFs>,
}

impl NotebookSession {
    /// Opens a session; `config_path` empty means built-in defaults.
    #[flutter_rust_bridge::frb(sync)]
    pub fn open(config_path: String) -> Result<NotebookSession, String> {
        let trimmed = config_path.trim();
        let config = if trimmed.is_empty() {
            NotebookConfig::default()
        } else {
            NotebookConfig::load(trimmed).map_err(|err| err.to_string())?
        };
        let notebook = Notebook::open_local(config).map_err(|err| err.to_string())?;
        Ok(Self { notebook })
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn root_folder_chosen(&mut self, path: String) -> TreeResponse {
        tree_response(self.notebook.on_root_folder_chosen(path.trim()).map(Some))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn roots(&self) -> Vec<TreeItem> {
        self.notebook
            .root_views()
            .into_iter()
            .map(to_tree_item)
            .collect()
    }

    /// Forgets a root. With `discard_unsaved=false` a dirty note below it
    /// yields `error_code=unsaved_changes`.
    #[flutter_rust_bridge::frb(sync)]
    pub fn root_detached(&mut self, path: String, discard_unsaved: bool) -> TreeResponse {
        let path = Path::new(&path);
        let result = if discard_unsaved {
            self.notebook.on_root_detached_discarding(path)
        } else {
            self.notebook.on_root_detached(path)
        };
        tree_response(result.map(|()| None))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn node_expand_requested(&mut self, path: String) -> TreeResponse {
        tree_response(
            self.notebook
                .on_node_expand_requested(Path::new(&path))
                .map(Some),
        )
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn rescan_requested(&mut self, path: String) -> TreeResponse {
        tree_response(self.notebook.on_rescan_requested(Path::new(&path)).map(Some))
    }

    /// Opens a note. With `discard_unsaved=false` a dirty buffer yields
    /// `error_code=unsaved_changes` so the UI can ask the user first.
    #[flutter_rust_bridge::frb(sync)]
    pub fn node_selected(&mut self, path: String, discard_unsaved: bool) -> DocumentResponse {
        let path = Path::new(&path);
        let result = if discard_unsaved {
            self.notebook.on_node_selected_discarding(path)
        } else {
            self.notebook.on_node_selected(path)
        };
        document_response(result)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn buffer_edited(&mut self, text: String) -> DocumentResponse {
        document_response(self.notebook.on_buffer_edited(text))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn save_requested(&mut self) -> DocumentResponse {
        document_response(self.notebook.on_save_requested())
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn create_folder(&mut self, parent: String, name: String) -> TreeResponse {
        tree_response(
            self.notebook
                .on_create_folder(Path::new(&parent), &name)
                .map(Some),
        )
    }

    /// Creates a note; an empty `name` picks a timestamp name.
    #[flutter_rust_bridge::frb(sync)]
    pub fn create_note(&mut self, parent: String, name: String) -> TreeResponse {
        let name = Some(name.as_str()).filter(|value| !value.trim().is_empty());
        tree_response(
            self.notebook
                .on_create_note(Path::new(&parent), name)
                .map(Some),
        )
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn delete_requested(&mut self, path: String) -> TreeResponse {
        tree_response(self.notebook.on_delete_requested(Path::new(&path)))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn rename_requested(&mut self, path: String, new_name: String) -> TreeResponse {
        tree_response(
            self.notebook
                .on_rename_requested(Path::new(&path), &new_name)
                .map(Some),
        )
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn move_requested(&mut self, path: String, new_parent: String) -> TreeResponse {
        tree_response(
            self.notebook
                .on_move_requested(Path::new(&path), Path::new(&new_parent))
                .map(Some),
        )
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn preview_requested(&self, buffer_text: String) -> PreviewResponse {
        match self.notebook.on_preview_requested(&buffer_text) {
            Ok(path) => PreviewResponse {
                ok: true,
                html_path: Some(path.display().to_string()),
                error_code: None,
                message: "Preview opened.".to_string(),
            },
            Err(err) => PreviewResponse {
                ok: false,
                html_path: None,
                error_code: Some(err.code().to_string()),
                message: err.to_string(),
            },
        }
    }
}

fn tree_response(result: Result<Option<NodeView>, NotebookError>) -> TreeResponse {
    match result {
        Ok(view) => TreeResponse {
            ok: true,
            item: view.map(to_tree_item),
            error_code: None,
            message: String::new(),
        },
        Err(err) => {
            warn!(
                "event=ffi_call module=ffi status=error error_code={} error={}",
                err.code(),
                err
            );
            TreeResponse {
                ok: false,
                item: None,
                error_code: Some(err.code().to_string()),
                message: err.to_string(),
            }
        }
    }
}

fn document_response(result: Result<DocumentView, NotebookError>) -> DocumentResponse {
    match result {
        Ok(view) => DocumentResponse {
            ok: true,
            path: Some(view.path.display().to_string()),
            title: Some(view.name),
            content: Some(view.content),
            is_dirty: view.is_dirty,
            error_code: None,
            message: String::new(),
        },
        Err(err) => DocumentResponse {
            ok: false,
            path: None,
            title: None,
            content: None,
            is_dirty: false,
            error_code: Some(err.code().to_string()),
            message: err.to_string(),
        },
    }
}

fn to_tree_item(view: NodeView) -> TreeItem {
    TreeItem {
        path: view.path.display().to_string(),
        name: view.name,
        kind: match view.kind {
            NodeKind::Folder => "folder",
            NodeKind::Note => "note",
        }
        .to_string(),
        children_loaded: view.children_loaded,
        children: view.children.into_iter().map(to_tree_item).collect(),
    }
}
