//! Turning size specs into terminal cells.
//!
//! Rows split their grid's area top to bottom and columns split their row's
//! area left to right, using [`crate::size::resolve`] for the pixel amounts.
//! Offsets are rounded cumulatively so adjacent siblings never leave a gap
//! or overlap.

use std::cell::Cell;
use std::rc::Rc;

use ratatui::layout::{Direction, Rect};

use crate::constants::MAX_CLEANUP_DEPTH;
use crate::layout::{Layout, RegionMap};
use crate::size::{SizeItem, resolve};
use crate::store::SubscriptionId;
use crate::tile::{TileId, TileKind};

/// Rectangles for every reachable tile of `layout` inside `area`. Panels
/// share their rectangle with their active tab and its content.
pub fn compute_regions(layout: &Layout, area: Rect) -> RegionMap<TileId> {
    let mut regions = RegionMap::default();
    place(layout, layout.root_id(), area, &mut regions, 0);
    regions
}

fn place(layout: &Layout, id: &TileId, area: Rect, regions: &mut RegionMap<TileId>, depth: usize) {
    // a tile referenced twice (or through a cycle) is placed once
    if depth > MAX_CLEANUP_DEPTH || regions.get(id).is_some() {
        return;
    }
    let Some(tile) = layout.get(id) else {
        return;
    };
    regions.set(id.clone(), area);
    match &tile.kind {
        TileKind::Grid(grid) => {
            for (row, rect) in split_axis(layout, &grid.rows, area, Direction::Vertical) {
                place(layout, &row, rect, regions, depth + 1);
            }
        }
        TileKind::Row(row) => {
            for (column, rect) in split_axis(layout, &row.columns, area, Direction::Horizontal) {
                place(layout, &column, rect, regions, depth + 1);
            }
        }
        TileKind::Column(column) => {
            if let Some(child) = &column.child {
                place(layout, child, area, regions, depth + 1);
            }
        }
        TileKind::Panel(_) => {
            if let Some(active) = layout.valid_active_tab(id) {
                place(layout, &active, area, regions, depth + 1);
            }
        }
        TileKind::Tab(tab) => {
            if let Some(content) = &tab.content {
                place(layout, content, area, regions, depth + 1);
            }
        }
        TileKind::Content(_) => {}
    }
}

fn split_axis(
    layout: &Layout,
    children: &[TileId],
    area: Rect,
    direction: Direction,
) -> Vec<(TileId, Rect)> {
    let items: Vec<SizeItem<TileId>> = children
        .iter()
        .filter_map(|id| {
            Some(SizeItem {
                id: id.clone(),
                spec: layout.get(id)?.size()?,
            })
        })
        .collect();
    let (origin, extent) = match direction {
        Direction::Horizontal => (area.x, area.width),
        Direction::Vertical => (area.y, area.height),
    };

    let mut out = Vec::with_capacity(items.len());
    let mut cursor = 0.0_f64;
    let mut start: u16 = 0;
    for allocation in resolve(f64::from(extent), &items) {
        cursor += allocation.pixels;
        let end = (cursor.round().max(0.0) as u16).min(extent);
        let len = end.saturating_sub(start);
        let offset = origin.saturating_add(start);
        let rect = match direction {
            Direction::Horizontal => Rect {
                x: offset,
                y: area.y,
                width: len,
                height: area.height,
            },
            Direction::Vertical => Rect {
                x: area.x,
                y: offset,
                width: area.width,
                height: len,
            },
        };
        out.push((allocation.id, rect));
        start = start.max(end);
    }
    out
}

/// Region map that is only recomputed when the area or the layout changed.
#[derive(Debug)]
pub struct GeometryCache {
    area: Rect,
    regions: RegionMap<TileId>,
    dirty: Rc<Cell<bool>>,
    subscription: Option<SubscriptionId>,
}

impl GeometryCache {
    pub fn new(area: Rect) -> Self {
        Self {
            area,
            regions: RegionMap::default(),
            dirty: Rc::new(Cell::new(true)),
            subscription: None,
        }
    }

    /// Listen to `layout` so any tile change invalidates the cache.
    pub fn attach(&mut self, layout: &mut Layout) {
        self.detach(layout);
        let dirty = Rc::clone(&self.dirty);
        self.subscription = Some(layout.subscribe(move |_| dirty.set(true)));
        self.dirty.set(true);
    }

    pub fn detach(&mut self, layout: &mut Layout) {
        if let Some(subscription) = self.subscription.take() {
            layout.unsubscribe(subscription);
        }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn resize(&mut self, area: Rect) {
        if area != self.area {
            self.area = area;
            self.dirty.set(true);
        }
    }

    pub fn regions(&mut self, layout: &Layout) -> &RegionMap<TileId> {
        if self.dirty.replace(false) {
            self.regions = compute_regions(layout, self.area);
            tracing::trace!(regions = self.regions.len(), area = ?self.area, "regions recomputed");
        }
        &self.regions
    }

    /// Panel under the cell at (`column`, `row`).
    pub fn panel_at(&mut self, layout: &Layout, column: u16, row: u16) -> Option<TileId> {
        let panels: Vec<TileId> = layout.panels().into_iter().cloned().collect();
        self.regions(layout).hit_test(column, row, &panels)
    }
}
