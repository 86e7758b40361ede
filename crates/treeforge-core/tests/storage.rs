use treeforge_core::{
    EditorConfig, Position, ProjectStorage, ProjectStore, StorageError,
};

fn storage() -> (tempfile::TempDir, ProjectStorage) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EditorConfig::default();
    config.resolve_paths(dir.path());
    let storage = ProjectStorage::from_config(&config);
    (dir, storage)
}

#[test]
fn save_and_load_by_id() {
    let (_dir, storage) = storage();
    let mut store = ProjectStore::new();
    let id = store.create_project("Saved", None);
    let tree_id = store.selected_tree().unwrap().id.clone();
    store.create_block(&tree_id, "wait", Position::new(3.0, 4.0)).unwrap();

    let path = storage.save(store.project().unwrap()).unwrap();
    assert!(path.ends_with(format!("bt-project-{}.json", id)));
    assert!(storage.exists(&id));

    let loaded = storage.load(&id).unwrap();
    assert_eq!(loaded.name, "Saved");
    assert_eq!(loaded.trees[&tree_id].blocks.len(), 2);
    // Built-ins are not stored.
    assert!(loaded.nodes.is_empty());
}

#[test]
fn saved_positions_reload_exactly() {
    let (_dir, storage) = storage();
    let mut store = ProjectStore::new();
    let id = store.create_project("Precise", None);
    let tree_id = store.selected_tree().unwrap().id.clone();
    // x parses one ulp off without serde_json's float_roundtrip feature.
    let position = Position::new(-388.24251901016396, 9_999.999_999_999_998);
    let block = store.create_block(&tree_id, "wait", position).unwrap();

    storage.save(store.project().unwrap()).unwrap();
    let loaded = storage.load(&id).unwrap();
    let back = loaded.trees[&tree_id].blocks[&block].position;
    assert_eq!(back.x.to_bits(), position.x.to_bits());
    assert_eq!(back.y.to_bits(), position.y.to_bits());
}

#[test]
fn list_reports_summaries_and_skips_garbage() {
    let (_dir, storage) = storage();
    let mut store = ProjectStore::new();
    store.create_project("One", None);
    storage.save(store.project().unwrap()).unwrap();
    store.create_project("Two", Some("second"));
    store.create_tree("Extra", None).unwrap();
    storage.save(store.project().unwrap()).unwrap();

    std::fs::write(storage.dir().join("bt-project-broken.json"), "{").unwrap();
    std::fs::write(storage.dir().join("notes.txt"), "ignored").unwrap();

    let list = storage.list().unwrap();
    assert_eq!(list.len(), 2);
    let two = list.iter().find(|s| s.name == "Two").unwrap();
    assert_eq!(two.trees, 2);
    assert_eq!(two.description.as_deref(), Some("second"));
}

#[test]
fn missing_project_is_not_found() {
    let (_dir, storage) = storage();
    assert!(storage.list().unwrap().is_empty());
    assert!(matches!(storage.load("nope"), Err(StorageError::NotFound(_))));
    assert!(matches!(storage.delete("nope"), Err(StorageError::NotFound(_))));
}

#[test]
fn delete_removes_document() {
    let (_dir, storage) = storage();
    let mut store = ProjectStore::new();
    let id = store.create_project("Gone", None);
    storage.save(store.project().unwrap()).unwrap();
    storage.delete(&id).unwrap();
    assert!(!storage.exists(&id));
}

#[test]
fn failed_save_keeps_in_memory_state() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();
    let storage = ProjectStorage::new(blocker.join("projects"), false);

    let mut store = ProjectStore::new();
    store.create_project("Unsaved", None);
    let tree_id = store.selected_tree().unwrap().id.clone();
    store.create_block(&tree_id, "wait", Position::default()).unwrap();

    assert!(storage.save(store.project().unwrap()).is_err());
    assert_eq!(store.project().unwrap().trees[&tree_id].blocks.len(), 2);
    assert!(store.can_undo());
}
