//! In-memory arena of tiles keyed by id.
//!
//! The store is the only place tile records are written. It keeps
//! referential integrity on removal (every reference to a removed id is
//! stripped from the remaining tiles) and tells subscribers about every
//! change through [`notify::Notifier`].

pub mod notify;

use std::collections::BTreeMap;

use crate::error::LayoutError;
use crate::tile::{Tile, TileId, TileKind};

pub use notify::{Notifier, SubscriptionId};

pub type TileMap = BTreeMap<TileId, Tile>;

#[derive(Debug, Default)]
pub struct TileStore {
    tiles: TileMap,
    notifier: Notifier,
}

impl TileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    pub fn contains(&self, id: &TileId) -> bool {
        self.tiles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &TileMap {
        &self.tiles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values()
    }

    /// Insert a new tile. A fresh id is generated when `id` is `None`.
    pub fn add(&mut self, id: Option<TileId>, parent: Option<TileId>, kind: TileKind) -> TileId {
        let id = id.unwrap_or_else(TileId::generate);
        tracing::trace!(tile_id = %id, tile_type = %kind.tile_type(), "add tile");
        self.tiles
            .insert(id.clone(), Tile::new(id.clone(), parent, kind));
        self.notifier.notify(&self.tiles);
        id
    }

    /// Replace a tile with an edited copy of itself.
    ///
    /// Returns false when `id` is unknown. Returns true without notifying
    /// when the edit leaves the record unchanged.
    pub fn update(&mut self, id: &TileId, edit: impl FnOnce(&mut Tile)) -> bool {
        let Some(current) = self.tiles.get(id) else {
            return false;
        };
        let mut next = current.clone();
        edit(&mut next);
        next.id = id.clone();
        if &next == current {
            return true;
        }
        self.tiles.insert(id.clone(), next);
        self.notifier.notify(&self.tiles);
        true
    }

    /// Delete a tile and strip every reference to it. Returns false for
    /// unknown ids.
    pub fn remove(&mut self, id: &TileId) -> bool {
        if self.tiles.remove(id).is_none() {
            return false;
        }
        tracing::trace!(tile_id = %id, "remove tile");
        for tile in self.tiles.values_mut() {
            tile.strip_reference(id);
        }
        self.notifier.notify(&self.tiles);
        true
    }

    /// Swap in a whole new map, e.g. after loading a saved layout.
    pub fn replace_all(&mut self, tiles: TileMap) {
        self.tiles = tiles;
        self.notifier.notify(&self.tiles);
    }

    pub(crate) fn snapshot(&self) -> TileMap {
        self.tiles.clone()
    }

    /// Put back a map taken with [`TileStore::snapshot`]; subscribers are
    /// only told when the contents actually differ.
    pub(crate) fn restore(&mut self, tiles: TileMap) {
        if self.tiles != tiles {
            self.replace_all(tiles);
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TileMap) + 'static) -> SubscriptionId {
        self.notifier.subscribe(listener)
    }

    pub fn subscribe_batched(
        &mut self,
        listener: impl FnMut(&TileMap) + 'static,
    ) -> SubscriptionId {
        self.notifier.subscribe_batched(listener)
    }

    pub fn on_error(&mut self, listener: impl FnMut(&LayoutError) + 'static) -> SubscriptionId {
        self.notifier.on_error(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn flush_frame(&mut self) -> bool {
        self.notifier.flush_frame(&self.tiles)
    }

    pub fn is_frame_pending(&self) -> bool {
        self.notifier.is_frame_pending()
    }

    pub(crate) fn hold_notifications(&mut self) {
        self.notifier.hold();
    }

    pub(crate) fn release_notifications(&mut self, commit: bool) {
        self.notifier.release(&self.tiles, commit);
    }

    pub(crate) fn report_error(&mut self, error: &LayoutError) {
        self.notifier.report_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size::SizeSpec;
    use crate::tile::{Column, Grid, Row};
    use std::cell::Cell;
    use std::rc::Rc;

    fn store_with_chain() -> (TileStore, TileId, TileId, TileId) {
        let mut store = TileStore::new();
        let grid = store.add(None, None, TileKind::Grid(Grid::default()));
        let row = store.add(
            None,
            Some(grid.clone()),
            TileKind::Row(Row {
                height: SizeSpec::FULL,
                columns: Vec::new(),
            }),
        );
        store.update(&grid, |t| {
            if let Some(g) = t.as_grid_mut() {
                g.rows.push(row.clone());
            }
        });
        let column = store.add(None, Some(row.clone()), TileKind::Column(Column::default()));
        store.update(&row, |t| {
            if let Some(r) = t.as_row_mut() {
                r.columns.push(column.clone());
            }
        });
        (store, grid, row, column)
    }

    #[test]
    fn add_generates_ids_and_respects_given_ones() {
        let mut store = TileStore::new();
        let given = store.add(Some(TileId::new("root")), None, TileKind::Grid(Grid::default()));
        assert_eq!(given.as_str(), "root");
        let generated = store.add(None, None, TileKind::Grid(Grid::default()));
        assert_ne!(generated, given);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn update_without_change_does_not_notify() {
        let (mut store, grid, _, _) = store_with_chain();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        store.subscribe(move |_| h.set(h.get() + 1));
        assert!(store.update(&grid, |_| {}));
        assert_eq!(hits.get(), 0);
        assert!(store.update(&grid, |t| t.pinned = true));
        assert_eq!(hits.get(), 1);
        assert!(!store.update(&TileId::new("missing"), |t| t.pinned = true));
    }

    #[test]
    fn update_cannot_rename_a_tile() {
        let (mut store, grid, _, _) = store_with_chain();
        store.update(&grid, |t| t.id = TileId::new("other"));
        assert!(store.contains(&grid));
        assert!(!store.contains(&TileId::new("other")));
    }

    #[test]
    fn remove_strips_references_and_notifies_once() {
        let (mut store, _, row, column) = store_with_chain();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        store.subscribe(move |_| h.set(h.get() + 1));
        assert!(store.remove(&column));
        assert_eq!(hits.get(), 1);
        assert!(store.get(&row).unwrap().as_row().unwrap().columns.is_empty());
        assert!(!store.remove(&column));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn restore_only_notifies_on_difference() {
        let (mut store, _, _, column) = store_with_chain();
        let snapshot = store.snapshot();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        store.subscribe(move |_| h.set(h.get() + 1));
        store.restore(snapshot.clone());
        assert_eq!(hits.get(), 0);
        store.remove(&column);
        store.restore(snapshot);
        assert_eq!(hits.get(), 2);
        assert!(store.contains(&column));
    }
}
