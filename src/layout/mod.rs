//! A layout instance: the tile store, its root grid and focus state, plus
//! the operations that reshape the tree.
//!
//! The mutation operations live in [`ops`] and [`split`], the upward
//! cleanup walk in [`cleanup`], focus bookkeeping in [`focus`] and the
//! pixel layout pass in [`geometry`].

pub mod builder;
pub mod cleanup;
pub mod focus;
pub mod geometry;
pub mod ops;
pub mod split;

pub use focus::FocusState;
pub use geometry::{GeometryCache, compute_regions};
pub use ops::TabOptions;
pub use split::SplitDirection;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use ratatui::layout::Rect;

use crate::error::{LayoutError, Result};
use crate::persist::PersistenceAdapter;
use crate::store::{SubscriptionId, TileMap, TileStore};
use crate::tile::{Grid, Tile, TileId, TileKind, TileType};

pub struct Layout {
    instance_id: String,
    store: TileStore,
    root: TileId,
    focus: FocusState,
    persistence: Option<Box<dyn PersistenceAdapter>>,
}

impl std::fmt::Debug for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("instance_id", &self.instance_id)
            .field("root", &self.root)
            .field("tiles", &self.store.len())
            .field("focus", &self.focus)
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

impl Layout {
    /// A layout holding nothing but an empty root grid.
    pub fn new() -> Self {
        let mut store = TileStore::new();
        let root = store.add(None, None, TileKind::Grid(Grid::default()));
        Self::from_parts(store, root, FocusState::default())
    }

    pub(crate) fn from_parts(store: TileStore, root: TileId, focus: FocusState) -> Self {
        Self {
            instance_id: uuid::Uuid::now_v7().to_string(),
            store,
            root,
            focus,
            persistence: None,
        }
    }

    /// Identifier of this layout instance, handed to renderers as
    /// `coreInstance`.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn root_id(&self) -> &TileId {
        &self.root
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    pub fn tiles(&self) -> &TileMap {
        self.store.tiles()
    }

    pub fn get(&self, id: &TileId) -> Option<&Tile> {
        self.store.get(id)
    }

    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    pub fn active_panel(&self) -> Option<&TileId> {
        self.focus.active_panel.as_ref()
    }

    pub fn focused_tab(&self) -> Option<&TileId> {
        self.focus.focused_tab.as_ref()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TileMap) + 'static) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn subscribe_batched(
        &mut self,
        listener: impl FnMut(&TileMap) + 'static,
    ) -> SubscriptionId {
        self.store.subscribe_batched(listener)
    }

    pub fn on_error(&mut self, listener: impl FnMut(&LayoutError) + 'static) -> SubscriptionId {
        self.store.on_error(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// End of a UI frame: deliver coalesced changes to batched subscribers
    /// and hand the layout to the persistence adapter if anything changed.
    pub fn flush_frame(&mut self) -> bool {
        if !self.store.flush_frame() {
            return false;
        }
        if self.persistence.is_some() {
            let snapshot = self.to_snapshot();
            if let Some(adapter) = self.persistence.as_mut()
                && let Err(err) = adapter.save(&snapshot)
            {
                tracing::warn!(error = %err, "failed to persist layout");
            }
        }
        true
    }

    pub fn set_persistence(&mut self, adapter: Box<dyn PersistenceAdapter>) {
        self.persistence = Some(adapter);
    }

    pub fn take_persistence(&mut self) -> Option<Box<dyn PersistenceAdapter>> {
        self.persistence.take()
    }

    /// Load whatever the adapter saved last. Returns true when a saved
    /// layout was found and accepted; a rejected one leaves the default
    /// layout in place.
    pub fn restore(&mut self) -> bool {
        let loaded = match self.persistence.as_mut() {
            Some(adapter) => adapter.load(),
            None => return false,
        };
        match loaded {
            Ok(Some(snapshot)) => self.load_or_default(snapshot),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read saved layout");
                false
            }
        }
    }

    /// Swap in a whole tree. Subscribers stay attached and are notified.
    pub(crate) fn replace_contents(&mut self, tiles: TileMap, root: TileId, focus: FocusState) {
        self.store.replace_all(tiles);
        self.root = root;
        self.focus = focus;
        self.reconcile_focus();
    }

    pub(crate) fn store_mut(&mut self) -> &mut TileStore {
        &mut self.store
    }

    pub(crate) fn focus_mut(&mut self) -> &mut FocusState {
        &mut self.focus
    }

    pub(crate) fn report_error(&mut self, error: &LayoutError) {
        self.store.report_error(error);
    }

    /// Run `op`, restoring the tile map and focus if it fails.
    ///
    /// Immediate subscribers never see the intermediate states: they get
    /// one notification with the final map on success and none on failure.
    pub(crate) fn atomically<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let tiles = self.store.snapshot();
        let focus = self.focus.clone();
        self.store.hold_notifications();
        match op(self) {
            Ok(value) => {
                self.store.release_notifications(true);
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(error = %err, "rolling back failed layout operation");
                self.store.restore(tiles);
                self.focus = focus;
                self.store.release_notifications(false);
                Err(err)
            }
        }
    }

    pub(crate) fn tile(&self, id: &TileId) -> Result<&Tile> {
        self.store
            .get(id)
            .ok_or_else(|| LayoutError::NotFound(id.clone()))
    }

    pub(crate) fn expect_type(&self, id: &TileId, expected: TileType, msg: &str) -> Result<&Tile> {
        let tile = self.tile(id)?;
        if tile.tile_type() != expected {
            return Err(LayoutError::hierarchy(format!(
                "{msg} (got {} `{id}`)",
                tile.tile_type()
            )));
        }
        Ok(tile)
    }

    /// Every tile reachable from the root, depth first: rows top to bottom,
    /// columns left to right, tabs in order.
    /// A tile reached twice (a reference cycle) is only visited once.
    pub fn walk(&self) -> Vec<&Tile> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::new();
        let mut stack = vec![&self.root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(tile) = self.store.get(id) else {
                continue;
            };
            out.push(tile);
            for child in tile.child_ids().into_iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Panels in tree order.
    pub fn panels(&self) -> Vec<&TileId> {
        self.walk()
            .into_iter()
            .filter(|tile| tile.tile_type() == TileType::Panel)
            .map(|tile| &tile.id)
            .collect()
    }

    /// Nearest ancestor (or self) of the given type.
    pub fn ancestor_of_type(&self, id: &TileId, ty: TileType) -> Option<&TileId> {
        let mut current = self.store.get(id)?;
        for _ in 0..crate::constants::MAX_CLEANUP_DEPTH {
            if current.tile_type() == ty {
                return Some(&current.id);
            }
            current = self.store.get(current.parent.as_ref()?)?;
        }
        None
    }

    /// Structural problems in the current tree, one line each. Empty for a
    /// well-formed layout.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let roots: Vec<_> = self.store.iter().filter(|t| t.is_root_grid()).collect();
        if roots.len() != 1 {
            problems.push(format!("expected one root grid, found {}", roots.len()));
        }
        for tile in self.store.iter() {
            for child in tile.child_ids() {
                match self.store.get(child) {
                    None => problems.push(format!("{} `{}` references missing `{child}`", tile.tile_type(), tile.id)),
                    Some(c) if c.parent.as_ref() != Some(&tile.id) => problems.push(format!(
                        "`{child}` is owned by `{}` but points at {:?}",
                        tile.id, c.parent
                    )),
                    Some(_) => {}
                }
            }
            if tile.pinned {
                continue;
            }
            match &tile.kind {
                TileKind::Panel(p) if p.tabs.is_empty() => {
                    problems.push(format!("panel `{}` has no tabs", tile.id))
                }
                TileKind::Panel(p) => {
                    if let Some(active) = &p.active_tab
                        && !p.tabs.contains(active)
                    {
                        problems.push(format!("panel `{}` activates a foreign tab", tile.id));
                    }
                }
                TileKind::Column(c) if c.child.is_none() => {
                    problems.push(format!("column `{}` is empty", tile.id))
                }
                TileKind::Row(r) if r.columns.is_empty() => {
                    problems.push(format!("row `{}` has no columns", tile.id))
                }
                TileKind::Grid(g) if g.rows.is_empty() && tile.parent.is_some() => {
                    problems.push(format!("nested grid `{}` has no rows", tile.id))
                }
                _ => {}
            }
        }
        problems
    }

    /// Indented outline of the tree, for logs and the CLI.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let mut seen = BTreeSet::new();
        self.describe_into(&self.root, 0, &mut seen, &mut out);
        out
    }

    fn describe_into<'a>(
        &'a self,
        id: &'a TileId,
        depth: usize,
        seen: &mut BTreeSet<&'a TileId>,
        out: &mut String,
    ) {
        let indent = "  ".repeat(depth);
        if !seen.insert(id) {
            let _ = writeln!(out, "{indent}<cycle {id}>");
            return;
        }
        let Some(tile) = self.store.get(id) else {
            let _ = writeln!(out, "{indent}<missing {id}>");
            return;
        };
        let marker = |cond: bool, s: &'static str| if cond { s } else { "" };
        let _ = match &tile.kind {
            TileKind::Grid(_) => writeln!(out, "{indent}grid {id}"),
            TileKind::Row(row) => writeln!(out, "{indent}row {id} [{}]", row.height),
            TileKind::Column(col) => writeln!(out, "{indent}column {id} [{}]", col.width),
            TileKind::Panel(_) => writeln!(
                out,
                "{indent}panel {id}{}",
                marker(self.active_panel() == Some(id), " (active)")
            ),
            TileKind::Tab(tab) => {
                let panel_active = tile
                    .parent
                    .as_ref()
                    .and_then(|p| self.store.get(p))
                    .and_then(|p| p.as_panel())
                    .is_some_and(|p| p.active_tab.as_ref() == Some(id));
                writeln!(
                    out,
                    "{indent}tab {id} \"{}\"{}{}",
                    tab.name,
                    marker(panel_active, " *"),
                    marker(self.focused_tab() == Some(id), " (focused)")
                )
            }
            TileKind::Content(content) => writeln!(
                out,
                "{indent}content {id} {}",
                content.component_id.as_deref().unwrap_or("-")
            ),
        };
        for child in tile.child_ids() {
            self.describe_into(child, depth + 1, seen, out);
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegionMap<T: Clone + Ord> {
    regions: BTreeMap<T, Rect>,
}

impl<T: Clone + Ord> Default for RegionMap<T> {
    fn default() -> Self {
        Self {
            regions: BTreeMap::new(),
        }
    }
}

impl<T: Clone + Ord> RegionMap<T> {
    pub fn ids(&self) -> Vec<T> {
        self.regions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn set(&mut self, id: T, rect: Rect) {
        self.regions.insert(id, rect);
    }

    pub fn get(&self, id: &T) -> Option<Rect> {
        self.regions.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, Rect)> + '_ {
        self.regions.iter().map(|(id, rect)| (id, *rect))
    }

    pub fn hit_test(&self, column: u16, row: u16, ids: &[T]) -> Option<T> {
        for id in ids {
            if let Some(rect) = self.regions.get(id)
                && rect_contains(*rect, column, row)
            {
                return Some(id.clone());
            }
        }
        None
    }
}

pub fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    let max_x = rect.x.saturating_add(rect.width);
    let max_y = rect.y.saturating_add(rect.height);
    column >= rect.x && column < max_x && row >= rect.y && row < max_y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_layout_has_single_empty_root() {
        let layout = Layout::new();
        assert_eq!(layout.store().len(), 1);
        let root = layout.get(layout.root_id()).unwrap();
        assert!(root.is_root_grid());
        assert!(layout.check_invariants().is_empty());
        assert!(layout.focused_tab().is_none());
    }

    #[test]
    fn walk_is_depth_first_in_child_order() {
        let mut layout = Layout::new();
        let root = layout.root_id().clone();
        let row = layout.add_row(&root, None).unwrap();
        let left = layout.add_column(&row, None).unwrap();
        let right = layout.add_column(&row, None).unwrap();
        let p_left = layout.add_panel(&left).unwrap();
        let p_right = layout.add_panel(&right).unwrap();
        layout.add_tab(&p_right, "b").unwrap();
        layout.add_tab(&p_left, "a").unwrap();
        assert_eq!(layout.panels(), vec![&p_left, &p_right]);
        assert_eq!(layout.walk()[0].id, root);
    }

    #[test]
    fn failed_atomic_op_rolls_back_without_notifying() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut layout = Layout::new();
        let root = layout.root_id().clone();
        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
        let s = seen.clone();
        layout.subscribe(move |tiles| s.borrow_mut().push(tiles.len()));
        let before = layout.tiles().clone();

        let result: Result<()> = layout.atomically(|layout| {
            let row = layout.add_row(&root, None)?;
            layout.add_column(&row, None)?;
            Err(LayoutError::invalid("late failure"))
        });
        assert!(matches!(result, Err(LayoutError::InvalidState(_))));
        assert_eq!(layout.tiles(), &before);
        assert!(seen.borrow().is_empty());
        assert!(!layout.flush_frame());

        let row = layout
            .atomically(|layout| {
                let row = layout.add_row(&root, None)?;
                layout.add_column(&row, None)?;
                Ok(row)
            })
            .unwrap();
        // root, row and column, delivered once
        assert_eq!(*seen.borrow(), vec![3]);
        assert!(layout.get(&row).is_some());
    }

    #[test]
    fn region_map_set_get_hit_test() {
        let mut map = RegionMap::default();
        let a = Rect {
            x: 0,
            y: 0,
            width: 5,
            height: 5,
        };
        let b = Rect {
            x: 6,
            y: 0,
            width: 5,
            height: 5,
        };
        map.set(1u8, a);
        map.set(2u8, b);
        assert_eq!(map.get(&1u8), Some(a));
        assert_eq!(map.ids(), vec![1u8, 2u8]);
        assert_eq!(map.hit_test(2, 2, &[1u8, 2u8]), Some(1u8));
        assert_eq!(map.hit_test(100, 100, &[1u8, 2u8]), None);
    }

    #[test]
    fn rect_contains_edge_cases() {
        let r = Rect {
            x: 0,
            y: 0,
            width: 0,
            height: 5,
        };
        assert!(!rect_contains(r, 0, 0));
        let r2 = Rect {
            x: 1,
            y: 1,
            width: 3,
            height: 3,
        };
        assert!(rect_contains(r2, 1, 1));
        assert!(!rect_contains(r2, 4, 1));
    }

    #[test]
    fn describe_marks_focus() {
        let mut layout = Layout::new();
        let root = layout.root_id().clone();
        let tab = layout.add_tab(&root, "Notes").unwrap();
        let text = layout.describe();
        assert!(text.contains("\"Notes\" * (focused)"), "{text}");
        assert!(text.contains(tab.as_str()));
    }
}
