use std::cell::RefCell;
use std::rc::Rc;

use indoc::indoc;
use tile_layout::{
    GeometryCache, JsonFileAdapter, Layout, MemoryAdapter, PersistenceAdapter, SerializedLayout,
    SplitDirection, TileId,
};

fn workbench() -> (Layout, TileId, TileId) {
    let mut layout = Layout::new();
    let root = layout.root_id().clone();
    let editor = layout.add_tab(&root, "editor").unwrap();
    let terminal = layout.add_tab(&root, "terminal").unwrap();
    let panel = layout.get(&editor).unwrap().parent.clone().unwrap();
    layout
        .split_panel(&terminal, &panel, SplitDirection::Right)
        .unwrap();
    layout.select_tab(&editor).unwrap();
    (layout, editor, terminal)
}

#[test]
fn json_round_trip_preserves_tiles_and_focus() {
    let (layout, editor, _) = workbench();
    let json = layout.to_json().unwrap();
    let loaded = Layout::from_json(&json).unwrap();
    assert_eq!(loaded.tiles(), layout.tiles());
    assert_eq!(loaded.root_id(), layout.root_id());
    assert_eq!(loaded.focused_tab(), Some(&editor));
    assert_eq!(loaded.active_panel(), layout.active_panel());
    assert_eq!(loaded.to_snapshot(), layout.to_snapshot());
}

#[test]
fn hand_written_payload_loads() {
    let json = indoc! {r#"
        {
          "tiles": [
            { "id": "root", "type": "grid", "parent": null, "rows": ["r"] },
            { "id": "r", "type": "row", "parent": "root", "height": "100%", "columns": ["c"] },
            { "id": "c", "type": "column", "parent": "r", "width": "100%", "child": "p" },
            { "id": "p", "type": "panel", "parent": "c", "tabs": ["t"], "activeTab": "t" },
            { "id": "t", "type": "tab", "parent": "p", "name": "notes", "content": "x", "isLazy": true },
            { "id": "x", "type": "content", "parent": "t", "componentId": "markdown", "data": { "path": "README.md" } }
          ],
          "metadata": { "activePanel": "p", "focusedActiveTab": "t" }
        }
    "#};
    let layout = Layout::from_json(json).unwrap();
    assert_eq!(layout.root_id(), &TileId::new("root"));
    assert_eq!(layout.focused_tab(), Some(&TileId::new("t")));
    let tab = layout.get(&TileId::new("t")).unwrap().as_tab().unwrap();
    assert!(tab.is_lazy);
    let content = layout.get(&TileId::new("x")).unwrap().as_content().unwrap();
    assert_eq!(content.component_id.as_deref(), Some("markdown"));
    assert_eq!(content.data["path"], "README.md");
    assert!(layout.check_invariants().is_empty());
}

#[test]
fn unsupported_auto_size_is_malformed() {
    let json = indoc! {r#"
        {
          "tiles": [
            { "id": "root", "type": "grid", "parent": null, "rows": ["r"] },
            { "id": "r", "type": "row", "parent": "root", "height": "auto", "columns": [] }
          ]
        }
    "#};
    assert!(SerializedLayout::from_json(json).is_err());
    let mut layout = Layout::new();
    assert!(!layout.load_json_or_default(json));
    assert!(layout.focused_tab().is_some());
}

#[test]
fn batched_subscribers_and_adapter_see_one_save_per_frame() {
    let (mut layout, editor, _) = workbench();
    let adapter = MemoryAdapter::new();
    layout.set_persistence(Box::new(adapter.clone()));
    let immediate = Rc::new(RefCell::new(0));
    let batched = Rc::new(RefCell::new(0));
    let i = immediate.clone();
    let b = batched.clone();
    layout.subscribe(move |_| *i.borrow_mut() += 1);
    layout.subscribe_batched(move |_| *b.borrow_mut() += 1);

    layout.rename_tab(&editor, "main.rs").unwrap();
    layout.rename_tab(&editor, "lib.rs").unwrap();
    assert_eq!(*immediate.borrow(), 2);
    assert_eq!(*batched.borrow(), 0);

    assert!(layout.flush_frame());
    assert!(!layout.flush_frame());
    assert_eq!(*batched.borrow(), 1);
    assert_eq!(adapter.save_count(), 1);

    let mut restored = Layout::new();
    restored.set_persistence(Box::new(adapter.clone()));
    assert!(restored.restore());
    let name = &restored.get(&editor).unwrap().as_tab().unwrap().name;
    assert_eq!(name, "lib.rs");
}

#[test]
fn split_notifies_immediate_subscribers_once_with_final_tree() {
    let (mut layout, editor, _) = workbench();
    let panel = layout.get(&editor).unwrap().parent.clone().unwrap();
    layout.add_tab(&panel, "notes").unwrap();
    let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
    let s = seen.clone();
    layout.subscribe(move |tiles| s.borrow_mut().push(tiles.len()));

    layout
        .split_panel(&editor, &panel, SplitDirection::Bottom)
        .unwrap();
    assert_eq!(*seen.borrow(), vec![layout.tiles().len()]);
    assert!(layout.check_invariants().is_empty());
}

#[test]
fn unchanged_rename_does_not_notify() {
    let (mut layout, editor, _) = workbench();
    let hits = Rc::new(RefCell::new(0));
    let h = hits.clone();
    layout.subscribe(move |_| *h.borrow_mut() += 1);
    layout.rename_tab(&editor, "editor").unwrap();
    assert_eq!(*hits.borrow(), 0);
}

#[test]
fn file_adapter_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("layout.json");
    let (mut layout, _, terminal) = workbench();
    layout.set_persistence(Box::new(JsonFileAdapter::new(&path)));
    layout.close_tab(&terminal).unwrap();
    assert!(layout.flush_frame());
    assert!(path.exists());

    let mut next = Layout::with_default_tab("fresh");
    next.set_persistence(Box::new(JsonFileAdapter::new(&path)));
    assert!(next.restore());
    assert_eq!(next.tiles(), layout.tiles());
    assert!(next.get(&terminal).is_none());
}

#[test]
fn corrupt_file_keeps_default_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.json");
    std::fs::write(&path, "{ \"tiles\": 3 }").unwrap();

    let mut adapter = JsonFileAdapter::new(&path);
    assert!(adapter.load().is_err());

    let mut layout = Layout::with_default_tab("fresh");
    let before = layout.tiles().clone();
    layout.set_persistence(Box::new(adapter));
    assert!(!layout.restore());
    assert_eq!(layout.tiles(), &before);
}

#[test]
fn geometry_cache_tracks_layout_changes() {
    let (mut layout, editor, terminal) = workbench();
    let mut cache = GeometryCache::new(ratatui::layout::Rect::new(0, 0, 100, 30));
    cache.attach(&mut layout);

    let editor_panel = layout.get(&editor).unwrap().parent.clone().unwrap();
    let terminal_panel = layout.get(&terminal).unwrap().parent.clone().unwrap();
    assert_eq!(cache.panel_at(&layout, 10, 10), Some(editor_panel.clone()));
    assert_eq!(cache.panel_at(&layout, 90, 10), Some(terminal_panel));
    assert!(!cache.is_dirty());

    layout.close_tab(&terminal).unwrap();
    assert!(cache.is_dirty());
    assert_eq!(cache.panel_at(&layout, 90, 10), Some(editor_panel));
    cache.detach(&mut layout);
}
