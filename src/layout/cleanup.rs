//! Keeping the hierarchy minimal after removals.
//!
//! [`Layout::cleanup`] walks from a tile up to the root. On the way it
//! deletes containers that lost their last child and collapses sub-grids
//! that wrap a single column. A removed row or column hands its size to the
//! siblings that share its unit.

use crate::constants::{MAX_CLEANUP_DEPTH, PERCENT_EPSILON};
use crate::error::{LayoutError, Result};
use crate::layout::Layout;
use crate::size::SizeSpec;
use crate::tile::{TileId, TileKind, TileType};

impl Layout {
    /// Walk upward from `start`, removing empty containers and collapsing
    /// single-path sub-grids. Problems are logged and reported to error
    /// listeners, never returned.
    pub fn cleanup(&mut self, start: &TileId) {
        if let Err(err) = self.cleanup_from(start) {
            tracing::warn!(tile_id = %start, error = %err, "layout cleanup failed");
            self.report_error(&err);
        }
    }

    fn cleanup_from(&mut self, start: &TileId) -> Result<()> {
        let mut current = Some(start.clone());
        for _ in 0..MAX_CLEANUP_DEPTH {
            let Some(id) = current.take() else {
                return Ok(());
            };
            let Some(tile) = self.get(&id) else {
                return Ok(());
            };
            let parent = tile.parent.clone();
            if tile.pinned {
                current = parent;
                continue;
            }
            if self.is_removable(&id) {
                self.remove_container(&id)?;
            } else if self.is_collapsible(&id) {
                self.collapse(&id)?;
            }
            current = parent;
        }
        Err(LayoutError::invalid(format!(
            "cleanup from `{start}` exceeded {MAX_CLEANUP_DEPTH} levels"
        )))
    }

    fn is_removable(&self, id: &TileId) -> bool {
        let Some(tile) = self.get(id) else {
            return false;
        };
        match &tile.kind {
            TileKind::Panel(panel) => panel.tabs.is_empty(),
            TileKind::Column(column) => column
                .child
                .as_ref()
                .is_none_or(|child| !self.store().contains(child)),
            TileKind::Row(row) => row.columns.is_empty(),
            TileKind::Grid(grid) => grid.rows.is_empty() && tile.parent.is_some(),
            TileKind::Tab(_) | TileKind::Content(_) => false,
        }
    }

    /// Grid with a parent, one row, one column and a live child in that
    /// column, where none of grid, row or column is pinned.
    fn collapse_chain(&self, id: &TileId) -> Option<(TileId, TileId, TileId, TileId)> {
        let grid = self.get(id)?;
        let outer = grid.parent.clone()?;
        let [row_id] = grid.as_grid()?.rows.as_slice() else {
            return None;
        };
        let row = self.get(row_id)?;
        let [column_id] = row.as_row()?.columns.as_slice() else {
            return None;
        };
        let column = self.get(column_id)?;
        let child = column.as_column()?.child.clone()?;
        if grid.pinned || row.pinned || column.pinned || !self.store().contains(&child) {
            return None;
        }
        Some((outer, row_id.clone(), column_id.clone(), child))
    }

    fn is_collapsible(&self, id: &TileId) -> bool {
        self.collapse_chain(id).is_some()
    }

    fn collapse(&mut self, grid: &TileId) -> Result<()> {
        let (outer, row, column, child) = self
            .collapse_chain(grid)
            .ok_or_else(|| LayoutError::invalid(format!("grid `{grid}` cannot collapse")))?;
        self.expect_type(&outer, TileType::Column, "sub-grids must sit in columns")?;
        tracing::debug!(grid_id = %grid, child_id = %child, column_id = %outer, "collapse grid");
        self.set_column_child(&outer, &child);
        self.store_mut()
            .update(&child, |t| t.parent = Some(outer.clone()));
        self.store_mut().update(&column, |t| {
            if let Some(c) = t.as_column_mut() {
                c.child = None;
            }
        });
        self.store_mut().remove(&column);
        self.store_mut().remove(&row);
        self.store_mut().remove(grid);
        Ok(())
    }

    fn remove_container(&mut self, id: &TileId) -> Result<()> {
        let tile = self.tile(id)?;
        let ty = tile.tile_type();
        if let (Some(size), Some(parent)) = (tile.size(), tile.parent.clone()) {
            self.give_size_to_siblings(&parent, id, size)?;
        }
        tracing::debug!(tile_id = %id, tile_type = %ty, "remove empty container");
        self.store_mut().remove(id);
        Ok(())
    }

    /// Spread `freed` over the siblings of `removed` that share its unit,
    /// in proportion to their sizes (equally when those sum to zero).
    fn give_size_to_siblings(
        &mut self,
        parent: &TileId,
        removed: &TileId,
        freed: SizeSpec,
    ) -> Result<()> {
        let siblings: Vec<_> = self
            .tile(parent)?
            .child_ids()
            .into_iter()
            .filter(|id| *id != removed)
            .filter_map(|id| Some((id.clone(), self.get(id)?.size()?)))
            .filter(|(_, size)| size.unit == freed.unit)
            .collect();
        if siblings.is_empty() {
            return Ok(());
        }
        let total: f64 = siblings.iter().map(|(_, size)| size.value).sum();
        let count = siblings.len() as f64;
        for (id, size) in siblings {
            let share = if total > PERCENT_EPSILON {
                freed.value * size.value / total
            } else {
                freed.value / count
            };
            self.store_mut().update(&id, |t| {
                t.set_size(size.grown(share));
            });
        }
        Ok(())
    }

    /// Collapse every single-path sub-grid until none are left. Returns the
    /// number of grids removed.
    pub fn simplify(&mut self) -> usize {
        let mut collapsed = 0;
        loop {
            let next = self
                .walk()
                .into_iter()
                .find(|tile| !tile.pinned && self.is_collapsible(&tile.id))
                .map(|tile| tile.id.clone());
            let Some(grid) = next else {
                break;
            };
            if let Err(err) = self.collapse(&grid) {
                tracing::warn!(grid_id = %grid, error = %err, "simplify stopped");
                self.report_error(&err);
                break;
            }
            collapsed += 1;
        }
        if collapsed > 0 {
            self.reconcile_focus();
        }
        collapsed
    }
}
