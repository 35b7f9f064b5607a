#![allow(dead_code)]

use notebook_core::{DirEntry, FsAdapter, FsError, FsResult, LocalFs};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Adapter operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    List,
    CreateDirectory,
    CreateFile,
    Read,
    Write,
    DeleteFile,
    DeleteDirectory,
    Rename,
}

/// Local adapter that counts listings and fails one chosen operation.
#[derive(Default)]
pub struct ScriptedFs {
    inner: LocalFs,
    list_calls: Cell<usize>,
    failure: RefCell<Option<(FsOp, FsError)>>,
}

impl ScriptedFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.get()
    }

    pub fn fail(&self, op: FsOp, err: FsError) {
        *self.failure.borrow_mut() = Some((op, err));
    }

    pub fn heal(&self) {
        *self.failure.borrow_mut() = None;
    }

    fn check(&self, op: FsOp) -> FsResult<()> {
        match &*self.failure.borrow() {
            Some((failing, err)) if *failing == op => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

impl FsAdapter for ScriptedFs {
    fn list_entries(&self, path: &Path) -> FsResult<Vec<DirEntry>> {
        self.list_calls.set(self.list_calls.get() + 1);
        self.check(FsOp::List)?;
        self.inner.list_entries(path)
    }

    fn create_directory(&self, path: &Path, exists_ok: bool) -> FsResult<()> {
        self.check(FsOp::CreateDirectory)?;
        self.inner.create_directory(path, exists_ok)
    }

    fn create_file(&self, path: &Path, initial_content: &str) -> FsResult<()> {
        self.check(FsOp::CreateFile)?;
        self.inner.create_file(path, initial_content)
    }

    fn read_file(&self, path: &Path) -> FsResult<String> {
        self.check(FsOp::Read)?;
        self.inner.read_file(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> FsResult<()> {
        self.check(FsOp::Write)?;
        self.inner.write_file(path, content)
    }

    fn delete_file(&self, path: &Path) -> FsResult<()> {
        self.check(FsOp::DeleteFile)?;
        self.inner.delete_file(path)
    }

    fn delete_directory_recursive(&self, path: &Path) -> FsResult<()> {
        self.check(FsOp::DeleteDirectory)?;
        self.inner.delete_directory_recursive(path)
    }

    fn rename(&self, old_path: &Path, new_path: &Path) -> FsResult<()> {
        self.check(FsOp::Rename)?;
        self.inner.rename(old_path, new_path)
    }
}

/// Temp notebook root:
///
/// ```text
/// root/
///   notes.txt      "top"
///   image.png
///   drafts/
///   a/
///     c.txt        "inside a"
///     deep/
///       d.txt      "deeper"
/// ```
pub fn fixture() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("notes.txt"), "top").unwrap();
    fs::write(root.join("image.png"), [0u8, 1, 2]).unwrap();
    fs::create_dir(root.join("drafts")).unwrap();
    fs::create_dir_all(root.join("a").join("deep")).unwrap();
    fs::write(root.join("a").join("c.txt"), "inside a").unwrap();
    fs::write(root.join("a").join("deep").join("d.txt"), "deeper").unwrap();
    (dir, root)
}

/// File names of `path`'s children, sorted for order-independent asserts.
pub fn sorted_names(children: &[PathBuf]) -> Vec<String> {
    let mut names: Vec<String> = children
        .iter()
        .map(|child| child.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
