mod support;

use notebook_core::{
    CommonMarkRenderer, ConfigError, FsAdapter, FsError, LocalFs, Notebook, NotebookConfig,
    NotebookError, PreviewError, PreviewViewer,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use support::{fixture, sorted_names, FsOp, ScriptedFs};

#[derive(Clone, Default)]
struct RecordingViewer {
    opened: Arc<Mutex<Vec<PathBuf>>>,
}

impl PreviewViewer for RecordingViewer {
    fn open(&self, path: &Path) -> Result<(), PreviewError> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

fn local_notebook(config: NotebookConfig) -> (Notebook<LocalFs>, RecordingViewer) {
    let viewer = RecordingViewer::default();
    let notebook = Notebook::with_collaborators(
        LocalFs::new(),
        config,
        Box::new(CommonMarkRenderer),
        Box::new(viewer.clone()),
    )
    .unwrap();
    (notebook, viewer)
}

#[test]
fn create_select_edit_save_round_trip() {
    let (_dir, root) = fixture();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());
    notebook.on_root_folder_chosen(&root).unwrap();

    notebook.mutations().create_note(&root, Some("x.txt"), "hello").unwrap();
    let note = root.join("x.txt");
    let opened = notebook.on_node_selected(&note).unwrap();
    assert_eq!(opened.content, "hello");
    assert!(!opened.is_dirty);

    let edited = notebook.on_buffer_edited("hello world").unwrap();
    assert!(edited.is_dirty);
    let saved = notebook.on_save_requested().unwrap();
    assert!(!saved.is_dirty);
    assert_eq!(notebook.fs().read_file(&note).unwrap(), "hello world");
}

#[test]
fn choosing_a_root_lists_it_immediately() {
    let (_dir, root) = fixture();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());

    let view = notebook.on_root_folder_chosen(&root).unwrap();
    assert_eq!(view.path, root);
    assert!(view.children_loaded);
    let children: Vec<PathBuf> = view.children.iter().map(|child| child.path.clone()).collect();
    assert_eq!(sorted_names(&children), vec!["a", "drafts", "notes.txt"]);
    assert_eq!(notebook.root_views().len(), 1);
}

#[test]
fn overlapping_roots_are_refused_and_renamed_root_stays_consistent() {
    let (_dir, root) = fixture();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());
    let inner = root.join("a");
    notebook.on_root_folder_chosen(&inner).unwrap();

    let err = notebook.on_root_folder_chosen(&root).unwrap_err();
    assert!(matches!(err, NotebookError::OverlappingRoot { .. }));
    assert_eq!(err.code(), "overlapping_root");
    assert_eq!(notebook.tree().roots(), &[inner.clone()]);
    assert!(!notebook.tree().contains(&root));

    let view = notebook.on_rename_requested(&inner, "b").unwrap();
    let renamed = root.join("b");
    assert_eq!(view.path, renamed);
    assert_eq!(notebook.tree().roots(), &[renamed.clone()]);
    assert!(!notebook.tree().contains(&inner));
    assert_eq!(notebook.root_views().len(), 1);
    assert!(matches!(
        notebook.on_root_folder_chosen(renamed.join("deep")),
        Err(NotebookError::OverlappingRoot { .. })
    ));
}

#[test]
fn equivalent_spellings_of_a_root_share_one_root() {
    let (_dir, root) = fixture();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());
    notebook.on_root_folder_chosen(&root).unwrap();

    let dotted = root.join("..").join("root").join(".");
    let view = notebook.on_root_folder_chosen(&dotted).unwrap();
    assert_eq!(view.path, root);
    assert_eq!(notebook.tree().roots(), &[root.clone()]);
}

#[test]
fn invalid_config_is_rejected_when_opening_a_notebook() {
    let config = NotebookConfig {
        note_extensions: vec!["md".to_string()],
        default_note_extension: "txt".to_string(),
        ..NotebookConfig::default()
    };
    let err = Notebook::open_local(config).err().unwrap();
    assert!(matches!(err, NotebookError::Config(ConfigError::Invalid(_))));

    let config = NotebookConfig {
        note_extensions: vec![".MD".to_string()],
        default_note_extension: "md".to_string(),
        ..NotebookConfig::default()
    };
    let notebook = Notebook::open_local(config).unwrap();
    assert_eq!(notebook.config().note_extensions, vec!["md".to_string()]);
}

#[test]
fn unreadable_root_is_not_kept() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    let (mut notebook, _) = local_notebook(NotebookConfig::default());

    let err = notebook.on_root_folder_chosen(&missing).unwrap_err();
    assert!(matches!(err, NotebookError::Fs(FsError::NotFound(_))));
    assert!(notebook.tree().roots().is_empty());
    assert!(notebook.tree().is_empty());
}

#[test]
fn selecting_another_note_with_unsaved_edits_needs_confirmation() {
    let (_dir, root) = fixture();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());
    notebook.on_root_folder_chosen(&root).unwrap();
    let first = root.join("notes.txt");
    notebook.on_node_expand_requested(&root.join("a")).unwrap();
    let second = root.join("a").join("c.txt");

    notebook.on_node_selected(&first).unwrap();
    notebook.on_buffer_edited("changed").unwrap();

    let err = notebook.on_node_selected(&second).unwrap_err();
    assert!(matches!(err, NotebookError::UnsavedChanges(ref path) if *path == first));
    assert_eq!(notebook.document().buffer(), Some("changed"));

    let view = notebook.on_node_selected_discarding(&second).unwrap();
    assert_eq!(view.content, "inside a");
    assert_eq!(fs::read_to_string(&first).unwrap(), "top");
}

#[test]
fn reselecting_the_open_note_with_unsaved_edits_needs_confirmation() {
    let (_dir, root) = fixture();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());
    notebook.on_root_folder_chosen(&root).unwrap();
    let note = root.join("notes.txt");
    notebook.on_node_selected(&note).unwrap();
    notebook.on_buffer_edited("unsaved work").unwrap();

    let err = notebook.on_node_selected(&note).unwrap_err();
    assert!(matches!(err, NotebookError::UnsavedChanges(ref path) if *path == note));
    assert_eq!(notebook.document().buffer(), Some("unsaved work"));

    let view = notebook.on_node_selected_discarding(&note).unwrap();
    assert_eq!(view.content, "top");
    assert!(!view.is_dirty);
}

#[test]
fn detaching_a_root_with_unsaved_edits_below_needs_confirmation() {
    let (_dir, root) = fixture();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());
    notebook.on_root_folder_chosen(&root).unwrap();
    let note = root.join("notes.txt");
    notebook.on_node_selected(&note).unwrap();
    notebook.on_buffer_edited("unsaved work").unwrap();

    let err = notebook.on_root_detached(&root).unwrap_err();
    assert!(matches!(err, NotebookError::UnsavedChanges(ref path) if *path == note));
    assert_eq!(notebook.tree().roots(), &[root.clone()]);
    assert_eq!(notebook.document().buffer(), Some("unsaved work"));

    notebook.on_root_detached_discarding(&root).unwrap();
    assert!(notebook.tree().is_empty());
    assert!(notebook.document().path().is_none());
    assert_eq!(fs::read_to_string(&note).unwrap(), "top");
}

#[test]
fn detaching_an_unrelated_root_keeps_unsaved_edits() {
    let (_dir, root) = fixture();
    let other = tempfile::tempdir().unwrap();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());
    notebook.on_root_folder_chosen(&root).unwrap();
    notebook.on_root_folder_chosen(other.path()).unwrap();
    notebook.on_node_selected(&root.join("notes.txt")).unwrap();
    notebook.on_buffer_edited("unsaved work").unwrap();

    notebook.on_root_detached(other.path()).unwrap();
    assert_eq!(notebook.tree().roots(), &[root.clone()]);
    assert_eq!(notebook.document().buffer(), Some("unsaved work"));
}

#[test]
fn unsaved_edits_are_discarded_silently_when_confirmation_is_off() {
    let (_dir, root) = fixture();
    let config = NotebookConfig {
        confirm_discard_unsaved: false,
        ..NotebookConfig::default()
    };
    let (mut notebook, _) = local_notebook(config);
    notebook.on_root_folder_chosen(&root).unwrap();
    notebook.on_create_note(&root, Some("other")).unwrap();

    notebook.on_node_selected(&root.join("notes.txt")).unwrap();
    notebook.on_buffer_edited("changed").unwrap();
    let view = notebook.on_node_selected(&root.join("other.txt")).unwrap();
    assert_eq!(view.content, "");
    assert!(!view.is_dirty);
}

#[test]
fn selecting_folders_or_unknown_paths_fails_without_state_change() {
    let (_dir, root) = fixture();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());
    notebook.on_root_folder_chosen(&root).unwrap();

    let err = notebook.on_node_selected(&root.join("a")).unwrap_err();
    assert!(matches!(err, NotebookError::NodeMustBeNote(_)));
    let err = notebook.on_node_selected(&root.join("image.png")).unwrap_err();
    assert!(matches!(err, NotebookError::NodeNotFound(_)));
    assert!(notebook.document().path().is_none());
    assert!(matches!(
        notebook.on_save_requested().unwrap_err(),
        NotebookError::NoActiveDocument
    ));
}

#[test]
fn failed_read_keeps_previous_document() {
    let (_dir, root) = fixture();
    let mut notebook = Notebook::new(ScriptedFs::new(), NotebookConfig::default()).unwrap();
    notebook.on_root_folder_chosen(&root).unwrap();
    let first = root.join("notes.txt");
    notebook.on_node_selected(&first).unwrap();

    notebook.on_create_note(&root, Some("second.txt")).unwrap();
    notebook
        .fs()
        .fail(FsOp::Read, FsError::PermissionDenied(root.join("second.txt")));
    let err = notebook.on_node_selected(&root.join("second.txt")).unwrap_err();
    assert!(matches!(err, NotebookError::Fs(FsError::PermissionDenied(_))));
    assert_eq!(notebook.document().path(), Some(first.as_path()));
}

#[test]
fn save_after_external_delete_surfaces_write_failure() {
    let (_dir, root) = fixture();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());
    notebook.on_root_folder_chosen(&root).unwrap();
    notebook.on_node_expand_requested(&root.join("a")).unwrap();
    notebook.on_node_selected(&root.join("a").join("c.txt")).unwrap();

    fs::remove_dir_all(root.join("a")).unwrap();
    let err = notebook.on_save_requested().unwrap_err();
    assert!(matches!(err, NotebookError::Fs(FsError::NotFound(_))));
    assert!(notebook.document().path().is_some());
}

#[test]
fn rename_and_delete_views_reflect_new_state() {
    let (_dir, root) = fixture();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());
    notebook.on_root_folder_chosen(&root).unwrap();

    let renamed = notebook.on_rename_requested(&root.join("drafts"), "archive").unwrap();
    assert_eq!(renamed.name, "archive");
    assert_eq!(renamed.path, root.join("archive"));

    let parent = notebook
        .on_delete_requested(&root.join("archive"))
        .unwrap()
        .unwrap();
    assert_eq!(parent.path, root);
    assert!(parent.children.iter().all(|child| child.name != "archive"));

    assert!(notebook.on_delete_requested(&root).unwrap().is_none());
    assert!(notebook.tree().roots().is_empty());
    assert!(!root.exists());
}

#[test]
fn rescan_invalidates_document_whose_file_vanished() {
    let (_dir, root) = fixture();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());
    notebook.on_root_folder_chosen(&root).unwrap();
    notebook.on_node_selected(&root.join("notes.txt")).unwrap();

    fs::remove_file(root.join("notes.txt")).unwrap();
    let view = notebook.on_rescan_requested(&root).unwrap();
    assert!(view.children.iter().all(|child| child.name != "notes.txt"));
    assert!(notebook.document().path().is_none());
}

#[test]
fn detaching_a_root_keeps_disk_and_clears_bound_document() {
    let (_dir, root) = fixture();
    let (mut notebook, _) = local_notebook(NotebookConfig::default());
    notebook.on_root_folder_chosen(&root).unwrap();
    notebook.on_node_selected(&root.join("notes.txt")).unwrap();

    notebook.on_root_detached(&root).unwrap();
    assert!(notebook.tree().is_empty());
    assert!(notebook.document().path().is_none());
    assert!(root.join("notes.txt").exists());
}

#[test]
fn preview_renders_writes_and_hands_off_to_viewer() {
    let (notebook, viewer) = local_notebook(NotebookConfig::default());

    let path = notebook.on_preview_requested("# Heading\n\n**bold**").unwrap();
    let html = fs::read_to_string(&path).unwrap();
    assert!(html.contains("<h1>Heading</h1>"));
    assert!(html.contains("<strong>bold</strong>"));
    assert_eq!(*viewer.opened.lock().unwrap(), vec![path.clone()]);
    fs::remove_file(path).unwrap();

    let err = notebook.on_preview_requested("   ").unwrap_err();
    assert!(matches!(err, NotebookError::Preview(PreviewError::Empty)));
    assert_eq!(viewer.opened.lock().unwrap().len(), 1);
}
