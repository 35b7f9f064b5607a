//! Notebook application state and presentation boundary.
//!
//! # Responsibility
//! - Own the tree model, the active-document tracker and the collaborators
//!   as one explicit state object (no ambient globals).
//! - Translate UI events into model/coordinator/tracker calls and return
//!   views for re-rendering.
//!
//! # Invariants
//! - Every failing call leaves prior in-memory state intact.
//! - Only the mutation coordinator edits tree structure after attach.
//! - Calls are processed one at a time; `&mut self` is the re-entrancy guard.

use crate::config::NotebookConfig;
use crate::error::{NotebookError, NotebookResult};
use crate::fs::{FsAdapter, FsError, LocalFs};
use crate::model::tree::{NodeKind, NodeView, TreeModel};
use crate::preview::{
    open_preview, render_document, CommonMarkRenderer, MarkdownRenderer, PreviewViewer,
    SystemViewer,
};
use crate::service::document::{DocumentTracker, DocumentView, PathChange};
use crate::service::mutation::MutationCoordinator;
use log::{info, warn};
use std::path::{Component, Path, PathBuf};

/// Whether a selection may replace a dirty buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedPolicy {
    /// Refuse with `UnsavedChanges` when the config asks for confirmation.
    Confirm,
    /// The user confirmed; drop the unsaved edits.
    Discard,
}

/// Single-user notebook session.
pub struct Notebook<F: FsAdapter = LocalFs> {
    fs: F,
    config: NotebookConfig,
    tree: TreeModel,
    document: DocumentTracker,
    renderer: Box<dyn MarkdownRenderer>,
    viewer: Box<dyn PreviewViewer>,
}

impl Notebook<LocalFs> {
    /// Creates a session over the local disk with default collaborators.
    pub fn open_local(config: NotebookConfig) -> NotebookResult<Self> {
        Self::new(LocalFs::new(), config)
    }
}

impl<F: FsAdapter> Notebook<F> {
    /// Creates a session over `fs` with the CommonMark renderer and the
    /// system viewer.
    pub fn new(fs: F, config: NotebookConfig) -> NotebookResult<Self> {
        Self::with_collaborators(
            fs,
            config,
            Box::new(CommonMarkRenderer),
            Box::new(SystemViewer),
        )
    }

    /// Creates a session; the config is normalized and must validate.
    pub fn with_collaborators(
        fs: F,
        config: NotebookConfig,
        renderer: Box<dyn MarkdownRenderer>,
        viewer: Box<dyn PreviewViewer>,
    ) -> NotebookResult<Self> {
        let config = config.normalized();
        config.validate()?;
        Ok(Self {
            fs,
            config,
            tree: TreeModel::new(),
            document: DocumentTracker::new(),
            renderer,
            viewer,
        })
    }

    pub fn config(&self) -> &NotebookConfig {
        &self.config
    }

    pub fn tree(&self) -> &TreeModel {
        &self.tree
    }

    pub fn document(&self) -> &DocumentTracker {
        &self.document
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Coordinator over this session's state.
    pub fn mutations(&mut self) -> MutationCoordinator<'_, F> {
        MutationCoordinator::new(&self.fs, &self.config, &mut self.tree, &mut self.document)
    }

    /// Attaches a user-chosen folder as a root and lists it.
    ///
    /// The path is made absolute and `.`/`..` are resolved lexically, so
    /// spellings of one directory share one root. A root that cannot be
    /// listed is not kept.
    pub fn on_root_folder_chosen(&mut self, path: impl AsRef<Path>) -> NotebookResult<NodeView> {
        let absolute = std::path::absolute(path.as_ref())
            .map_err(|err| FsError::from_io(path.as_ref(), err))?;
        let path = normalize_lexically(&absolute);
        let newly_attached = !self.tree.roots().contains(&path);
        self.tree.attach_root(path.clone())?;
        if let Err(err) = self.tree.expand(&self.fs, &self.config, &path) {
            if newly_attached {
                self.tree.detach_root(&path)?;
            }
            return Err(err.into());
        }
        self.node_view(&path)
    }

    /// Forgets a root without touching disk, refusing to drop unsaved edits
    /// of a note below it when the config asks for confirmation.
    pub fn on_root_detached(&mut self, path: &Path) -> NotebookResult<()> {
        self.detach_with_policy(path, UnsavedPolicy::Confirm)
    }

    /// Forgets a root after the user agreed to lose edits below it.
    pub fn on_root_detached_discarding(&mut self, path: &Path) -> NotebookResult<()> {
        self.detach_with_policy(path, UnsavedPolicy::Discard)
    }

    pub fn detach_with_policy(&mut self, path: &Path, policy: UnsavedPolicy) -> NotebookResult<()> {
        if !self.tree.roots().iter().any(|root| root == path) {
            return Err(NotebookError::NodeNotFound(path.to_path_buf()));
        }
        self.ensure_discard_allowed(policy, Some(path))?;
        self.document.invalidate(path, &PathChange::Deleted);
        self.tree.detach_root(path)?;
        Ok(())
    }

    /// Lists a folder on first expansion; cached afterwards.
    pub fn on_node_expand_requested(&mut self, path: &Path) -> NotebookResult<NodeView> {
        self.tree.expand(&self.fs, &self.config, path)?;
        self.node_view(path)
    }

    /// Re-lists a folder, dropping children that vanished from disk.
    pub fn on_rescan_requested(&mut self, path: &Path) -> NotebookResult<NodeView> {
        let dropped = self.tree.rescan(&self.fs, &self.config, path)?;
        for child in &dropped {
            self.document.invalidate(child, &PathChange::Deleted);
        }
        self.node_view(path)
    }

    /// Opens a note in the editor, refusing to drop unsaved edits when the
    /// config asks for confirmation. Re-selecting the bound note reloads it
    /// from disk, so it is guarded the same way.
    pub fn on_node_selected(&mut self, path: &Path) -> NotebookResult<DocumentView> {
        self.select_with_policy(path, UnsavedPolicy::Confirm)
    }

    /// Opens a note in the editor after the user agreed to lose edits.
    pub fn on_node_selected_discarding(&mut self, path: &Path) -> NotebookResult<DocumentView> {
        self.select_with_policy(path, UnsavedPolicy::Discard)
    }

    pub fn select_with_policy(
        &mut self,
        path: &Path,
        policy: UnsavedPolicy,
    ) -> NotebookResult<DocumentView> {
        let node = self
            .tree
            .get(path)
            .ok_or_else(|| NotebookError::NodeNotFound(path.to_path_buf()))?;
        if node.kind != NodeKind::Note {
            return Err(NotebookError::NodeMustBeNote(path.to_path_buf()));
        }
        self.ensure_discard_allowed(policy, None)?;
        if self.document.is_dirty() {
            info!(
                "event=document_discard module=app status=ok path={}",
                self.document.path().unwrap_or(path).display()
            );
        }
        self.document.select(&self.fs, path)?;
        self.document_view()
    }

    /// Records an edit of the editor buffer.
    pub fn on_buffer_edited(&mut self, text: impl Into<String>) -> NotebookResult<DocumentView> {
        self.document.set_buffer(text)?;
        self.document_view()
    }

    /// Writes the editor buffer to the bound note.
    pub fn on_save_requested(&mut self) -> NotebookResult<DocumentView> {
        self.document.save(&self.fs)?;
        self.document_view()
    }

    pub fn on_create_folder(&mut self, parent: &Path, name: &str) -> NotebookResult<NodeView> {
        self.mutations().create_folder(parent, name)?;
        self.node_view(parent)
    }

    /// Creates an empty note; `None` picks a timestamp name.
    pub fn on_create_note(
        &mut self,
        parent: &Path,
        name: Option<&str>,
    ) -> NotebookResult<NodeView> {
        self.mutations().create_note(parent, name, "")?;
        self.node_view(parent)
    }

    /// Deletes a folder (recursively) or a note.
    ///
    /// Returns the parent's view, or `None` when a root itself was deleted.
    pub fn on_delete_requested(&mut self, path: &Path) -> NotebookResult<Option<NodeView>> {
        let is_root = self.tree.roots().iter().any(|root| root == path);
        self.mutations().delete(path)?;
        if is_root {
            return Ok(None);
        }
        Ok(path.parent().and_then(|parent| self.tree.view(parent)))
    }

    /// Renames a node; returns the renamed node's view.
    pub fn on_rename_requested(&mut self, path: &Path, new_name: &str) -> NotebookResult<NodeView> {
        let new_path = self.mutations().rename(path, new_name)?;
        self.node_view(&new_path)
    }

    /// Moves a node under another folder; returns the target folder's view.
    pub fn on_move_requested(
        &mut self,
        path: &Path,
        new_parent: &Path,
    ) -> NotebookResult<NodeView> {
        self.mutations().move_node(path, new_parent)?;
        self.node_view(new_parent)
    }

    /// Renders buffer text and opens it in the external viewer.
    pub fn on_preview_requested(&self, buffer_text: &str) -> NotebookResult<PathBuf> {
        match open_preview(self.renderer.as_ref(), self.viewer.as_ref(), buffer_text) {
            Ok(path) => Ok(path),
            Err(err) => {
                warn!("event=preview module=app status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Renders buffer text to an HTML document without opening it.
    pub fn render_preview(&self, buffer_text: &str) -> NotebookResult<String> {
        Ok(render_document(self.renderer.as_ref(), buffer_text)?)
    }

    /// Views of every root.
    pub fn root_views(&self) -> Vec<NodeView> {
        self.tree.views()
    }

    /// Fails with `UnsavedChanges` when a dirty document bound at or below
    /// `scope` (anywhere, for `None`) would be dropped without consent.
    fn ensure_discard_allowed(
        &self,
        policy: UnsavedPolicy,
        scope: Option<&Path>,
    ) -> NotebookResult<()> {
        if policy == UnsavedPolicy::Discard
            || !self.config.confirm_discard_unsaved
            || !self.document.is_dirty()
        {
            return Ok(());
        }
        match self.document.path() {
            Some(bound) if scope.map_or(true, |scope| bound.starts_with(scope)) => {
                Err(NotebookError::UnsavedChanges(bound.to_path_buf()))
            }
            _ => Ok(()),
        }
    }

    fn node_view(&self, path: &Path) -> NotebookResult<NodeView> {
        self.tree
            .view(path)
            .ok_or_else(|| NotebookError::NodeNotFound(path.to_path_buf()))
    }

    fn document_view(&self) -> NotebookResult<DocumentView> {
        self.document.view().ok_or(NotebookError::NoActiveDocument)
    }
}

/// Resolves `.` and `..` without touching disk; `..` at the top stays put.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::normalize_lexically;
    use std::path::{Path, PathBuf};

    #[test]
    fn lexical_normalization_resolves_dot_segments() {
        assert_eq!(
            normalize_lexically(Path::new("/notes/r/../r/./a")),
            PathBuf::from("/notes/r/a")
        );
        assert_eq!(normalize_lexically(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize_lexically(Path::new("/r/")), PathBuf::from("/r"));
    }
}
