use ratatui::layout::Rect;
use tile_layout::layout::compute_regions;
use tile_layout::{Layout, SizeSpec, SplitDirection, TileId};

fn column_of(layout: &Layout, panel: &TileId) -> TileId {
    layout.get(panel).unwrap().parent.clone().unwrap()
}

fn tabs_of(layout: &Layout, panel: &TileId) -> Vec<TileId> {
    layout.get(panel).unwrap().as_panel().unwrap().tabs.clone()
}

fn percent_total(layout: &Layout, ids: &[TileId]) -> f64 {
    ids.iter()
        .map(|id| layout.get(id).unwrap().size().unwrap().value)
        .sum()
}

#[test]
fn first_tab_in_fresh_layout_is_active_and_focused() {
    let mut layout = Layout::new();
    let root = layout.root_id().clone();
    let row = layout.add_row(&root, None).unwrap();
    let column = layout.add_column(&row, None).unwrap();
    let panel = layout.add_panel(&column).unwrap();
    let tab = layout.add_tab(&panel, "A").unwrap();

    assert_eq!(tabs_of(&layout, &panel), vec![tab.clone()]);
    assert_eq!(
        layout.get(&panel).unwrap().as_panel().unwrap().active_tab.as_ref(),
        Some(&tab)
    );
    assert_eq!(layout.focused_tab(), Some(&tab));
    assert_eq!(layout.active_panel(), Some(&panel));
    assert!(layout.check_invariants().is_empty());
}

#[test]
fn unsized_column_takes_equal_share_and_siblings_rescale() {
    let mut layout = Layout::new();
    let root = layout.root_id().clone();
    let row = layout.add_row(&root, None).unwrap();
    let a = layout.add_column(&row, Some(SizeSpec::percent(30.0))).unwrap();
    let b = layout.add_column(&row, Some(SizeSpec::percent(70.0))).unwrap();
    let c = layout.add_column(&row, None).unwrap();

    let share = layout.get(&c).unwrap().size().unwrap();
    assert!(share.is_percent());
    assert!((share.value - 100.0 / 3.0).abs() < 0.01);
    let a_size = layout.get(&a).unwrap().size().unwrap().value;
    let b_size = layout.get(&b).unwrap().size().unwrap().value;
    assert!((a_size / b_size - 30.0 / 70.0).abs() < 1e-6);
    assert!((percent_total(&layout, &[a, b, c]) - 100.0).abs() < 1e-6);
}

#[test]
fn moving_tabs_out_empties_and_removes_the_source() {
    let mut layout = Layout::new();
    let root = layout.root_id().clone();
    let row = layout.add_row(&root, None).unwrap();
    let left = layout.add_column(&row, None).unwrap();
    let right = layout.add_column(&row, None).unwrap();
    let p = layout.add_panel(&left).unwrap();
    let q = layout.add_panel(&right).unwrap();
    let a = layout.add_tab(&p, "A").unwrap();
    let b = layout.add_tab(&p, "B").unwrap();
    layout.add_tab(&q, "C").unwrap();
    layout.select_tab(&a).unwrap();

    layout.move_tab(&a, &q, None).unwrap();
    assert_eq!(tabs_of(&layout, &p), vec![b.clone()]);
    assert_eq!(
        layout.get(&p).unwrap().as_panel().unwrap().active_tab.as_ref(),
        Some(&b)
    );
    assert!(tabs_of(&layout, &q).contains(&a));

    layout.move_tab(&b, &q, None).unwrap();
    assert!(layout.get(&p).is_none());
    assert!(layout.get(&left).is_none());
    assert_eq!(
        layout.get(&right).unwrap().size(),
        Some(SizeSpec::percent(100.0))
    );
    assert_eq!(layout.get(&row).unwrap().as_row().unwrap().columns, vec![right]);
    assert!(layout.check_invariants().is_empty());
}

#[test]
fn right_split_halves_pixel_column() {
    let mut layout = Layout::new();
    let root = layout.root_id().clone();
    let row = layout.add_row(&root, None).unwrap();
    let before = layout.add_column(&row, Some(SizeSpec::pixels(100.0))).unwrap();
    let x_column = layout.add_column(&row, Some(SizeSpec::pixels(400.0))).unwrap();
    let after = layout.add_column(&row, Some(SizeSpec::pixels(100.0))).unwrap();
    let x = layout.add_panel(&x_column).unwrap();
    let a = layout.add_tab(&x, "A").unwrap();
    let keep = layout.add_tab(&x, "B").unwrap();
    layout.add_tab(&before, "left").unwrap();
    layout.add_tab(&after, "right").unwrap();

    let new_panel = layout.split_panel(&a, &x, SplitDirection::Right).unwrap();

    let new_column = column_of(&layout, &new_panel);
    assert_eq!(
        layout.get(&row).unwrap().as_row().unwrap().columns,
        vec![before, x_column.clone(), new_column.clone(), after]
    );
    assert_eq!(layout.get(&x_column).unwrap().size(), Some(SizeSpec::pixels(200.0)));
    assert_eq!(layout.get(&new_column).unwrap().size(), Some(SizeSpec::pixels(200.0)));
    assert_eq!(tabs_of(&layout, &new_panel), vec![a.clone()]);
    assert_eq!(tabs_of(&layout, &x), vec![keep]);
    assert_eq!(layout.get(&a).unwrap().parent.as_ref(), Some(&new_panel));
    assert!(layout.check_invariants().is_empty());
}

#[test]
fn single_path_sub_grid_collapses_into_outer_column() {
    let mut layout = Layout::new();
    let root = layout.root_id().clone();
    let row = layout.add_row(&root, None).unwrap();
    let outer = layout.add_column(&row, None).unwrap();
    let side = layout.add_column(&row, None).unwrap();
    let side_panel = layout.add_panel(&side).unwrap();
    layout.add_tab(&side_panel, "side").unwrap();

    let grid = layout.add_grid(Some(&outer)).unwrap();
    let inner_row = layout.add_row(&grid, None).unwrap();
    let inner_column = layout.add_column(&inner_row, None).unwrap();
    let panel = layout.add_panel(&inner_column).unwrap();
    let stays = layout.add_tab(&panel, "stays").unwrap();
    let leaves = layout.add_tab(&panel, "leaves").unwrap();

    layout.move_tab(&leaves, &side_panel, None).unwrap();

    for gone in [&grid, &inner_row, &inner_column] {
        assert!(layout.get(gone).is_none(), "{gone} should be collapsed");
    }
    assert_eq!(
        layout.get(&outer).unwrap().as_column().unwrap().child.as_ref(),
        Some(&panel)
    );
    assert_eq!(layout.get(&panel).unwrap().parent.as_ref(), Some(&outer));
    assert_eq!(tabs_of(&layout, &panel), vec![stays]);
    assert!(layout.check_invariants().is_empty());
}

#[test]
fn payload_with_two_roots_falls_back_to_default() {
    let json = indoc::indoc! {r#"
        {
          "tiles": [
            { "id": "g1", "type": "grid", "parent": null, "rows": [] },
            { "id": "g2", "type": "grid", "parent": null, "rows": [] }
          ],
          "metadata": { "activePanel": null, "focusedActiveTab": null }
        }
    "#};
    assert!(Layout::from_json(json).is_err());

    let mut layout = Layout::new();
    assert!(!layout.load_json_or_default(json));
    assert!(layout.get(&TileId::new("g1")).is_none());
    assert!(layout.get(&TileId::new("g2")).is_none());
    let tab = layout.focused_tab().cloned().unwrap();
    assert_eq!(layout.get(&tab).unwrap().as_tab().unwrap().name, "Untitled");
    assert!(layout.check_invariants().is_empty());
}

#[test]
fn top_split_of_root_panel_builds_sub_grid() {
    let mut layout = Layout::new();
    let root = layout.root_id().clone();
    let top = layout.add_tab(&root, "top").unwrap();
    let bottom = layout.add_tab(&root, "bottom").unwrap();
    let panel = layout.get(&top).unwrap().parent.clone().unwrap();

    let new_panel = layout.split_panel(&bottom, &panel, SplitDirection::Bottom).unwrap();

    assert_ne!(new_panel, panel);
    assert_eq!(tabs_of(&layout, &panel), vec![top]);
    assert_eq!(tabs_of(&layout, &new_panel), vec![bottom.clone()]);
    assert_eq!(layout.focused_tab(), Some(&bottom));
    let grid = layout
        .ancestor_of_type(&column_of(&layout, &new_panel), tile_layout::TileType::Grid)
        .cloned()
        .unwrap();
    assert_ne!(&grid, layout.root_id());
    assert!(layout.check_invariants().is_empty());
}

#[test]
fn bottom_split_beside_a_sibling_column_leaves_the_sibling_alone() {
    let mut layout = Layout::new();
    let root = layout.root_id().clone();
    let top_row = layout.add_row(&root, None).unwrap();
    let outer = layout.add_column(&top_row, None).unwrap();
    let grid = layout.add_grid(Some(&outer)).unwrap();
    let row = layout.add_row(&grid, None).unwrap();
    let left = layout.add_column(&row, None).unwrap();
    let right = layout.add_column(&row, None).unwrap();
    let editor = layout.add_panel(&left).unwrap();
    let preview = layout.add_panel(&right).unwrap();
    let main_rs = layout.add_tab(&editor, "main.rs").unwrap();
    layout.add_tab(&editor, "lib.rs").unwrap();
    layout.add_tab(&preview, "preview").unwrap();

    let area = Rect::new(0, 0, 100, 40);
    let before = compute_regions(&layout, area);
    let new_panel = layout
        .split_panel(&main_rs, &editor, SplitDirection::Bottom)
        .unwrap();
    let after = compute_regions(&layout, area);

    assert_eq!(after.get(&preview), before.get(&preview));
    assert_eq!(after.get(&right), before.get(&right));
    assert_eq!(layout.get(&row).unwrap().as_row().unwrap().columns, vec![left.clone(), right]);

    let left_rect = after.get(&left).unwrap();
    let upper = after.get(&editor).unwrap();
    let lower = after.get(&new_panel).unwrap();
    assert_eq!((upper.x, upper.width), (left_rect.x, left_rect.width));
    assert_eq!((lower.x, lower.width), (left_rect.x, left_rect.width));
    assert_eq!(upper.y, left_rect.y);
    assert_eq!(upper.height, left_rect.height / 2);
    assert_eq!(lower.y, upper.y + upper.height);
    assert_eq!(tabs_of(&layout, &new_panel), vec![main_rs]);
    assert!(layout.check_invariants().is_empty());
}

#[test]
fn splitting_lone_tab_into_own_panel_is_refused() {
    let mut layout = Layout::with_default_tab("only");
    let tab = layout.focused_tab().cloned().unwrap();
    let panel = layout.active_panel().cloned().unwrap();
    let before = layout.tiles().clone();
    assert!(layout.split_panel(&tab, &panel, SplitDirection::Left).is_err());
    assert_eq!(layout.tiles(), &before);
}

#[test]
fn closing_last_tab_unwinds_to_bare_root() {
    let mut layout = Layout::with_default_tab("only");
    let tab = layout.focused_tab().cloned().unwrap();
    layout.close_tab(&tab).unwrap();
    assert_eq!(layout.store().len(), 1);
    assert!(layout.focused_tab().is_none());
    assert!(layout.active_panel().is_none());
    assert!(layout.check_invariants().is_empty());
}
