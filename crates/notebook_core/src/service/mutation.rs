//! Mutation coordinator: filesystem first, model second.
//!
//! # Responsibility
//! - Run create/rename/delete/move as one logical step over the adapter,
//!   the tree model and the active-document tracker.
//!
//! # Invariants
//! - Preconditions are checked against the model before disk is touched.
//! - A failed filesystem call leaves the model and the tracker untouched.
//! - The tracker is invalidated/rebound before the model removes or
//!   rekeys a subtree, so it never holds a path the model cannot resolve.
//! - The model is never edited speculatively.

use crate::config::NotebookConfig;
use crate::error::{NotebookError, NotebookResult};
use crate::fs::{FsAdapter, FsResult};
use crate::model::tree::{NodeKind, TreeModel, TreeNode};
use crate::service::document::{DocumentTracker, PathChange};
use crate::service::naming::{normalize_entry_name, note_file_name};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Borrowing view over the notebook state that performs mutations.
pub struct MutationCoordinator<'a, F: FsAdapter> {
    fs: &'a F,
    config: &'a NotebookConfig,
    tree: &'a mut TreeModel,
    document: &'a mut DocumentTracker,
}

impl<'a, F: FsAdapter> MutationCoordinator<'a, F> {
    pub fn new(
        fs: &'a F,
        config: &'a NotebookConfig,
        tree: &'a mut TreeModel,
        document: &'a mut DocumentTracker,
    ) -> Self {
        Self {
            fs,
            config,
            tree,
            document,
        }
    }

    /// Creates one folder under `parent`. Returns the new folder path.
    pub fn create_folder(&mut self, parent: &Path, name: &str) -> NotebookResult<PathBuf> {
        self.require_kind(parent, NodeKind::Folder)?;
        let name = normalize_entry_name(name)?;
        let path = parent.join(&name);
        let exists_ok = self.config.create_dir_exists_ok;
        if self.tree.contains(&path) && !exists_ok {
            return Err(NotebookError::NodeExists(path));
        }

        logged(
            "create_folder",
            &path,
            self.fs.create_directory(&path, exists_ok),
        )?;
        if !self.tree.contains(&path) {
            self.tree.insert_child(parent, TreeNode::folder(path.clone()))?;
        }
        Ok(path)
    }

    /// Creates one note under `parent`. Returns the new note path.
    ///
    /// Without a name a timestamp name is used; names lacking a recognized
    /// extension get the configured default one.
    pub fn create_note(
        &mut self,
        parent: &Path,
        name: Option<&str>,
        initial_content: &str,
    ) -> NotebookResult<PathBuf> {
        self.require_kind(parent, NodeKind::Folder)?;
        let file_name = note_file_name(self.config, name)?;
        let path = parent.join(file_name);
        if self.tree.contains(&path) {
            return Err(NotebookError::NodeExists(path));
        }

        logged(
            "create_note",
            &path,
            self.fs.create_file(&path, initial_content),
        )?;
        self.tree.insert_child(parent, TreeNode::note(path.clone()))?;
        Ok(path)
    }

    /// Deletes a folder and everything below it, on disk and in the model.
    pub fn delete_folder(&mut self, path: &Path) -> NotebookResult<()> {
        self.require_kind(path, NodeKind::Folder)?;
        logged(
            "delete_folder",
            path,
            self.fs.delete_directory_recursive(path),
        )?;
        self.document.invalidate(path, &PathChange::Deleted);
        self.tree.remove_child(path)?;
        Ok(())
    }

    /// Deletes one note, on disk and in the model.
    pub fn delete_note(&mut self, path: &Path) -> NotebookResult<()> {
        self.require_kind(path, NodeKind::Note)?;
        logged("delete_note", path, self.fs.delete_file(path))?;
        self.document.invalidate(path, &PathChange::Deleted);
        self.tree.remove_child(path)?;
        Ok(())
    }

    /// Deletes whatever kind of node lives at `path`.
    pub fn delete(&mut self, path: &Path) -> NotebookResult<()> {
        match self.kind_of(path)? {
            NodeKind::Folder => self.delete_folder(path),
            NodeKind::Note => self.delete_note(path),
        }
    }

    /// Renames one node in place. Returns its new path.
    pub fn rename(&mut self, path: &Path, new_name: &str) -> NotebookResult<PathBuf> {
        let kind = self.kind_of(path)?;
        let name = normalize_entry_name(new_name)?;
        if kind == NodeKind::Note && !self.config.is_note_name(&name) {
            return Err(NotebookError::InvalidName(new_name.to_string()));
        }
        let parent = path
            .parent()
            .ok_or_else(|| NotebookError::InvalidName(new_name.to_string()))?;
        let new_path = parent.join(&name);
        if new_path == path {
            return Ok(new_path);
        }
        if self.tree.contains(&new_path) {
            return Err(NotebookError::NodeExists(new_path));
        }

        logged("rename", path, self.fs.rename(path, &new_path))?;
        self.document
            .invalidate(path, &PathChange::Renamed(new_path.clone()));
        self.tree.rekey(path, &new_path)?;
        Ok(new_path)
    }

    /// Moves one node under another folder. Returns its new path.
    pub fn move_node(&mut self, path: &Path, new_parent: &Path) -> NotebookResult<PathBuf> {
        self.kind_of(path)?;
        self.require_kind(new_parent, NodeKind::Folder)?;
        let invalid = || NotebookError::InvalidMove {
            node: path.to_path_buf(),
            target: new_parent.to_path_buf(),
        };
        if self.tree.roots().iter().any(|root| root == path) || new_parent.starts_with(path) {
            return Err(invalid());
        }
        if path.parent() == Some(new_parent) {
            return Ok(path.to_path_buf());
        }
        let name = path.file_name().ok_or_else(invalid)?;
        let new_path = new_parent.join(name);
        if self.tree.contains(&new_path) {
            return Err(NotebookError::NodeExists(new_path));
        }

        logged("move", path, self.fs.rename(path, &new_path))?;
        self.document
            .invalidate(path, &PathChange::Renamed(new_path.clone()));
        self.tree.rekey(path, &new_path)?;
        Ok(new_path)
    }

    fn kind_of(&self, path: &Path) -> NotebookResult<NodeKind> {
        self.tree
            .get(path)
            .map(|node| node.kind)
            .ok_or_else(|| NotebookError::NodeNotFound(path.to_path_buf()))
    }

    fn require_kind(&self, path: &Path, expected: NodeKind) -> NotebookResult<()> {
        match (self.kind_of(path)?, expected) {
            (NodeKind::Folder, NodeKind::Folder) | (NodeKind::Note, NodeKind::Note) => Ok(()),
            (_, NodeKind::Folder) => Err(NotebookError::NodeMustBeFolder(path.to_path_buf())),
            (_, NodeKind::Note) => Err(NotebookError::NodeMustBeNote(path.to_path_buf())),
        }
    }
}

fn logged<T>(event: &str, path: &Path, result: FsResult<T>) -> NotebookResult<T> {
    match result {
        Ok(value) => {
            info!(
                "event={event} module=mutation status=ok path={}",
                path.display()
            );
            Ok(value)
        }
        Err(err) => {
            warn!(
                "event={event} module=mutation status=error path={} error_code={} error={}",
                path.display(),
                err.code(),
                err
            );
            Err(err.into())
        }
    }
}
