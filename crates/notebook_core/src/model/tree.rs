//! In-memory navigable tree mirroring the on-disk folder hierarchy.
//!
//! # Responsibility
//! - Own every `TreeNode`, keyed by absolute path.
//! - Populate folders lazily through the filesystem adapter.
//! - Apply structural edits (insert/remove/rekey) requested by the
//!   mutation coordinator after the filesystem already changed.
//!
//! # Invariants
//! - A node's `path` is its identity; no two nodes share one.
//! - A non-root node's parent is `path.parent()`.
//! - `children` is only meaningful when `children_loaded` is true and keeps
//!   directory-listing order (no sorting).
//! - A failed expansion leaves the model exactly as it was.
//! - Folder descendants are contiguous in the path-ordered node map, so
//!   subtree scans are range scans.

use crate::config::NotebookConfig;
use crate::fs::{FsAdapter, FsError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Result type used by tree model operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors from tree model operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// No node is known at this path.
    NodeNotFound(PathBuf),
    /// Node exists but is not a folder.
    NodeMustBeFolder(PathBuf),
    /// A node already occupies the target path.
    NodeExists(PathBuf),
    /// Root would lie inside, or contain, the carried existing root.
    OverlappingRoot { path: PathBuf, root: PathBuf },
    /// Listing the folder failed.
    Fs(FsError),
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(path) => write!(f, "tree node not found: {}", path.display()),
            Self::NodeMustBeFolder(path) => {
                write!(f, "tree node must be folder: {}", path.display())
            }
            Self::NodeExists(path) => write!(f, "tree node already exists: {}", path.display()),
            Self::OverlappingRoot { path, root } => write!(
                f,
                "root {} overlaps existing root {}",
                path.display(),
                root.display()
            ),
            Self::Fs(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TreeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fs(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FsError> for TreeError {
    fn from(value: FsError) -> Self {
        Self::Fs(value)
    }
}

/// Tree node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Directory; may hold child nodes.
    Folder,
    /// File with a recognized note extension.
    Note,
}

/// One filesystem entry known to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Absolute path; also the node identity.
    pub path: PathBuf,
    /// Last path segment, used as the display label.
    pub name: String,
    pub kind: NodeKind,
    /// False until the folder has been listed once.
    pub children_loaded: bool,
    /// Child paths in listing order.
    pub children: Vec<PathBuf>,
}

impl TreeNode {
    /// Creates an unloaded folder node.
    pub fn folder(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), NodeKind::Folder)
    }

    /// Creates a note node.
    pub fn note(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), NodeKind::Note)
    }

    fn new(path: PathBuf, kind: NodeKind) -> Self {
        let name = display_name(&path);
        Self {
            path,
            name,
            kind,
            children_loaded: false,
            children: Vec::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// Serializable snapshot of one node and its loaded descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub path: PathBuf,
    pub name: String,
    pub kind: NodeKind,
    pub children_loaded: bool,
    pub children: Vec<NodeView>,
}

/// Path-keyed tree of folders and notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeModel {
    nodes: BTreeMap<PathBuf, TreeNode>,
    roots: Vec<PathBuf>,
}

impl TreeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a user-chosen folder as a root.
    ///
    /// Existence is not checked here; the first `expand` reports it.
    /// Re-attaching an existing root returns it unchanged. A path inside or
    /// above another root is refused, so every node has exactly one owner.
    pub fn attach_root(&mut self, path: impl Into<PathBuf>) -> TreeResult<&TreeNode> {
        let path = path.into();
        if !self.roots.contains(&path) {
            if let Some(root) = self
                .roots
                .iter()
                .find(|root| path.starts_with(root) || root.starts_with(&path))
            {
                return Err(TreeError::OverlappingRoot {
                    path,
                    root: root.clone(),
                });
            }
            info!(
                "event=tree_attach_root module=tree status=ok path={}",
                path.display()
            );
            self.roots.push(path.clone());
            self.nodes.insert(path.clone(), TreeNode::folder(path.clone()));
        }
        self.nodes
            .get(&path)
            .ok_or(TreeError::NodeNotFound(path))
    }

    /// Drops a root and its loaded subtree from the model. Disk is untouched.
    pub fn detach_root(&mut self, path: &Path) -> TreeResult<()> {
        if !self.roots.iter().any(|root| root == path) {
            return Err(TreeError::NodeNotFound(path.to_path_buf()));
        }
        self.remove_child(path)?;
        Ok(())
    }

    /// Root paths in attach order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn get(&self, path: &Path) -> Option<&TreeNode> {
        self.nodes.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    /// Total number of known nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a folder has been listed. `None` for unknown paths.
    pub fn is_loaded(&self, path: &Path) -> Option<bool> {
        self.nodes.get(path).map(|node| node.children_loaded)
    }

    /// Loaded child paths of one folder, without touching disk.
    pub fn children(&self, path: &Path) -> TreeResult<&[PathBuf]> {
        let node = self.require_folder(path)?;
        Ok(&node.children)
    }

    /// Lists a folder once and caches the result.
    ///
    /// Already-loaded folders return their cached children without an
    /// adapter call. On adapter failure nothing changes.
    pub fn expand<F: FsAdapter>(
        &mut self,
        fs: &F,
        config: &NotebookConfig,
        path: &Path,
    ) -> TreeResult<&[PathBuf]> {
        if self.require_folder(path)?.children_loaded {
            return Ok(&self.nodes[path].children);
        }
        self.load_children(fs, config, path)?;
        Ok(&self.nodes[path].children)
    }

    /// Re-lists an already known folder, reconciling with disk.
    ///
    /// Children still present keep their loaded subtrees; vanished children
    /// are dropped. Returns the dropped child paths.
    pub fn rescan<F: FsAdapter>(
        &mut self,
        fs: &F,
        config: &NotebookConfig,
        path: &Path,
    ) -> TreeResult<Vec<PathBuf>> {
        self.require_folder(path)?;
        self.load_children(fs, config, path)
    }

    /// Registers a node created on disk under `parent`.
    ///
    /// If the parent is loaded the node is appended to its children;
    /// otherwise it is adopted by the parent's first expansion.
    pub fn insert_child(&mut self, parent: &Path, node: TreeNode) -> TreeResult<()> {
        self.require_folder(parent)?;
        if node.path.parent() != Some(parent) {
            return Err(TreeError::NodeNotFound(node.path.clone()));
        }
        if self.nodes.contains_key(&node.path) {
            return Err(TreeError::NodeExists(node.path.clone()));
        }

        let child_path = node.path.clone();
        self.nodes.insert(child_path.clone(), node);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            if parent_node.children_loaded {
                parent_node.children.push(child_path.clone());
            }
        }
        debug!(
            "event=tree_insert module=tree status=ok parent={} path={}",
            parent.display(),
            child_path.display()
        );
        Ok(())
    }

    /// Removes a node and every descendant. Returns the removed node.
    pub fn remove_child(&mut self, path: &Path) -> TreeResult<TreeNode> {
        if !self.nodes.contains_key(path) {
            return Err(TreeError::NodeNotFound(path.to_path_buf()));
        }
        self.unlink(path);
        let keys = self.subtree_keys(path);
        let mut removed = None;
        for key in &keys {
            let node = self.nodes.remove(key);
            if key == path {
                removed = node;
            }
        }
        debug!(
            "event=tree_remove module=tree status=ok path={} removed_nodes={}",
            path.display(),
            keys.len()
        );
        removed.ok_or_else(|| TreeError::NodeNotFound(path.to_path_buf()))
    }

    /// Re-identifies a node and all of its descendants under `new_path`,
    /// preserving subtree shape.
    ///
    /// Same-parent rekeys keep the node's slot in its parent's children.
    /// Cross-parent rekeys (moves) detach from the old parent and attach to
    /// the new one like `insert_child`.
    pub fn rekey(&mut self, old_path: &Path, new_path: &Path) -> TreeResult<()> {
        if !self.nodes.contains_key(old_path) {
            return Err(TreeError::NodeNotFound(old_path.to_path_buf()));
        }
        if old_path == new_path {
            return Ok(());
        }
        if self.nodes.contains_key(new_path) {
            return Err(TreeError::NodeExists(new_path.to_path_buf()));
        }

        let is_root = self.roots.iter().any(|root| root == old_path);
        let same_parent = is_root || old_path.parent() == new_path.parent();
        if !same_parent {
            let new_parent = new_path
                .parent()
                .ok_or_else(|| TreeError::NodeNotFound(new_path.to_path_buf()))?;
            self.require_folder(new_parent)?;
        }

        let keys = self.subtree_keys(old_path);
        let moved: Vec<TreeNode> = keys
            .iter()
            .filter_map(|key| self.nodes.remove(key))
            .collect();
        for mut node in moved {
            node.path = swap_prefix(&node.path, old_path, new_path);
            node.children = node
                .children
                .iter()
                .map(|child| swap_prefix(child, old_path, new_path))
                .collect();
            if node.path == new_path {
                node.name = display_name(new_path);
            }
            self.nodes.insert(node.path.clone(), node);
        }

        if same_parent {
            self.replace_link(old_path, new_path);
        } else {
            self.unlink(old_path);
            if let Some(parent) = new_path.parent().and_then(|p| self.nodes.get_mut(p)) {
                if parent.children_loaded {
                    parent.children.push(new_path.to_path_buf());
                }
            }
        }

        debug!(
            "event=tree_rekey module=tree status=ok old={} new={} nodes={}",
            old_path.display(),
            new_path.display(),
            keys.len()
        );
        Ok(())
    }

    /// Snapshot of one node and its loaded descendants.
    pub fn view(&self, path: &Path) -> Option<NodeView> {
        let node = self.nodes.get(path)?;
        let children = node
            .children
            .iter()
            .filter_map(|child| self.view(child))
            .collect();
        Some(NodeView {
            path: node.path.clone(),
            name: node.name.clone(),
            kind: node.kind,
            children_loaded: node.children_loaded,
            children,
        })
    }

    /// Snapshots of every root.
    pub fn views(&self) -> Vec<NodeView> {
        self.roots.iter().filter_map(|root| self.view(root)).collect()
    }

    fn require_folder(&self, path: &Path) -> TreeResult<&TreeNode> {
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| TreeError::NodeNotFound(path.to_path_buf()))?;
        if !node.is_folder() {
            return Err(TreeError::NodeMustBeFolder(path.to_path_buf()));
        }
        Ok(node)
    }

    fn load_children<F: FsAdapter>(
        &mut self,
        fs: &F,
        config: &NotebookConfig,
        path: &Path,
    ) -> TreeResult<Vec<PathBuf>> {
        let entries = match fs.list_entries(path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "event=tree_expand module=tree status=error path={} error_code={} error={}",
                    path.display(),
                    err.code(),
                    err
                );
                return Err(err.into());
            }
        };

        let mut listed = Vec::new();
        for entry in entries {
            let kind = if entry.is_directory {
                NodeKind::Folder
            } else if config.is_note_name(&entry.name) {
                NodeKind::Note
            } else {
                continue;
            };
            listed.push((path.join(&entry.name), kind));
        }

        // Nodes registered before this listing (loaded subtrees on rescan,
        // pending inserts on first expand) survive only if still listed with
        // the same kind.
        let known: Vec<PathBuf> = self
            .nodes
            .keys()
            .filter(|key| key.parent() == Some(path))
            .cloned()
            .collect();
        let mut dropped = Vec::new();
        for child in known {
            let keep = listed
                .iter()
                .any(|(listed_path, kind)| *listed_path == child && self.nodes[&child].kind == *kind);
            if !keep {
                for key in self.subtree_keys(&child) {
                    self.nodes.remove(&key);
                }
                dropped.push(child);
            }
        }

        let mut children = Vec::with_capacity(listed.len());
        for (child_path, kind) in listed {
            self.nodes
                .entry(child_path.clone())
                .or_insert_with(|| TreeNode::new(child_path.clone(), kind));
            children.push(child_path);
        }

        if let Some(node) = self.nodes.get_mut(path) {
            node.children = children;
            node.children_loaded = true;
            info!(
                "event=tree_expand module=tree status=ok path={} children={} dropped={}",
                path.display(),
                node.children.len(),
                dropped.len()
            );
        }
        Ok(dropped)
    }

    fn subtree_keys(&self, root: &Path) -> Vec<PathBuf> {
        self.nodes
            .range(root.to_path_buf()..)
            .take_while(|(key, _)| key.starts_with(root))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn unlink(&mut self, path: &Path) {
        if let Some(index) = self.roots.iter().position(|root| root == path) {
            self.roots.remove(index);
            return;
        }
        if let Some(parent) = path.parent().and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|child| child != path);
        }
    }

    fn replace_link(&mut self, old_path: &Path, new_path: &Path) {
        if let Some(slot) = self.roots.iter_mut().find(|root| root.as_path() == old_path) {
            *slot = new_path.to_path_buf();
            return;
        }
        if let Some(parent) = old_path.parent().and_then(|p| self.nodes.get_mut(p)) {
            if let Some(slot) = parent
                .children
                .iter_mut()
                .find(|child| child.as_path() == old_path)
            {
                *slot = new_path.to_path_buf();
            }
        }
    }
}

/// Last path segment, or the whole path for filesystem roots like `/`.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn swap_prefix(path: &Path, old_prefix: &Path, new_prefix: &Path) -> PathBuf {
    match path.strip_prefix(old_prefix) {
        Ok(rest) if rest.as_os_str().is_empty() => new_prefix.to_path_buf(),
        Ok(rest) => new_prefix.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
