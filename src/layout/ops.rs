//! Tree mutation operations: adding containers and tabs, moving, closing
//! and reordering tabs.
//!
//! Every operation checks placement rules before touching the store and
//! runs inside [`Layout::atomically`], so a failure leaves the tree as it
//! was. Operations that can empty a container finish with a cleanup walk
//! from the affected panel.

use serde_json::{Map, Value};

use crate::constants::FULL_PERCENT;
use crate::error::{LayoutError, Result};
use crate::layout::Layout;
use crate::size::{SizeSpec, rescale_percent};
use crate::tile::{Column, Content, Grid, Panel, Row, Tab, TileId, TileKind, TileType};

/// How a new tab enters its panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabOptions {
    pub make_active: bool,
    pub is_lazy: bool,
}

impl Default for TabOptions {
    fn default() -> Self {
        Self {
            make_active: true,
            is_lazy: false,
        }
    }
}

impl TabOptions {
    /// Add the tab without stealing focus.
    pub fn background() -> Self {
        Self {
            make_active: false,
            is_lazy: false,
        }
    }

    pub fn lazy(mut self) -> Self {
        self.is_lazy = true;
        self
    }
}

impl Layout {
    /// Create a grid. Without a parent this creates the root, which only
    /// succeeds if the layout has none; with a parent the grid becomes the
    /// child of that (empty) column.
    pub fn add_grid(&mut self, parent_column: Option<&TileId>) -> Result<TileId> {
        let Some(column) = parent_column else {
            if self.store().iter().any(|t| t.is_root_grid()) {
                return Err(LayoutError::invalid("a root grid already exists"));
            }
            let id = self
                .store_mut()
                .add(None, None, TileKind::Grid(Grid::default()));
            return Ok(id);
        };
        self.expect_type(column, TileType::Column, "grids may only be nested in columns")?;
        self.ensure_column_empty(column)?;
        let id = self.store_mut().add(
            None,
            Some(column.clone()),
            TileKind::Grid(Grid::default()),
        );
        self.set_column_child(column, &id);
        tracing::debug!(grid_id = %id, column_id = %column, "add grid");
        Ok(id)
    }

    /// Append a row to `grid`. Without an explicit height the row takes an
    /// equal share and percent siblings shrink to make room.
    pub fn add_row(&mut self, grid: &TileId, height: Option<SizeSpec>) -> Result<TileId> {
        let siblings = self
            .expect_type(grid, TileType::Grid, "rows may only be added to grids")?
            .child_ids()
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        let height = self.share_axis(&siblings, height);
        let id = self.store_mut().add(
            None,
            Some(grid.clone()),
            TileKind::Row(Row {
                height,
                columns: Vec::new(),
            }),
        );
        self.store_mut().update(grid, |t| {
            if let Some(g) = t.as_grid_mut() {
                g.rows.push(id.clone());
            }
        });
        tracing::debug!(row_id = %id, grid_id = %grid, %height, "add row");
        Ok(id)
    }

    /// Append a column to `row`, sharing width like [`Layout::add_row`].
    pub fn add_column(&mut self, row: &TileId, width: Option<SizeSpec>) -> Result<TileId> {
        let siblings = self
            .expect_type(row, TileType::Row, "columns may only be added to rows")?
            .child_ids()
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        let width = self.share_axis(&siblings, width);
        let id = self.store_mut().add(
            None,
            Some(row.clone()),
            TileKind::Column(Column {
                width,
                child: None,
            }),
        );
        self.store_mut().update(row, |t| {
            if let Some(r) = t.as_row_mut() {
                r.columns.push(id.clone());
            }
        });
        tracing::debug!(column_id = %id, row_id = %row, %width, "add column");
        Ok(id)
    }

    pub fn add_panel(&mut self, column: &TileId) -> Result<TileId> {
        self.expect_type(column, TileType::Column, "panels may only be added to columns")?;
        self.ensure_column_empty(column)?;
        let id = self.store_mut().add(
            None,
            Some(column.clone()),
            TileKind::Panel(Panel::default()),
        );
        self.set_column_child(column, &id);
        tracing::debug!(panel_id = %id, column_id = %column, "add panel");
        Ok(id)
    }

    /// Put a content tile directly into an empty column, without a panel
    /// or tab around it (sidebar style).
    pub fn add_content(
        &mut self,
        column: &TileId,
        component_id: Option<&str>,
        data: Map<String, Value>,
    ) -> Result<TileId> {
        self.expect_type(column, TileType::Column, "content may only be placed in columns")?;
        self.ensure_column_empty(column)?;
        let id = self.store_mut().add(
            None,
            Some(column.clone()),
            TileKind::Content(Content {
                component_id: component_id.map(str::to_string),
                data,
            }),
        );
        self.set_column_child(column, &id);
        Ok(id)
    }

    /// Add a focused tab under `parent`. See [`Layout::add_tab_with`].
    pub fn add_tab(&mut self, parent: &TileId, name: &str) -> Result<TileId> {
        self.add_tab_with(parent, name, TabOptions::default())
    }

    /// Add a tab under a panel, column, row or grid. Non-panel parents are
    /// searched for a panel, and the missing row, column or panel is
    /// created when there is none.
    pub fn add_tab_with(&mut self, parent: &TileId, name: &str, options: TabOptions) -> Result<TileId> {
        self.atomically(|layout| {
            let panel = layout.panel_for_new_tab(parent)?;
            let tab = layout.insert_tab(&panel, name, options);
            layout.reconcile_focus();
            Ok(tab)
        })
    }

    fn panel_for_new_tab(&mut self, parent: &TileId) -> Result<TileId> {
        let kind = self.tile(parent)?.kind.clone();
        match kind {
            TileKind::Panel(_) => Ok(parent.clone()),
            TileKind::Column(column) => match column.child.clone() {
                Some(child) if self.store().contains(&child) => {
                    match self.tile(&child)?.tile_type() {
                        TileType::Panel => Ok(child),
                        TileType::Grid => self.panel_for_new_tab(&child),
                        other => Err(LayoutError::hierarchy(format!(
                            "column `{parent}` holds {other} content and cannot take tabs"
                        ))),
                    }
                }
                _ => self.add_panel(parent),
            },
            TileKind::Row(row) => {
                let column = match row.columns.last().cloned() {
                    Some(column) => column,
                    None => self.add_column(parent, None)?,
                };
                self.panel_for_new_tab(&column)
            }
            TileKind::Grid(grid) => {
                let last_row = grid.rows.last().cloned();
                if let Some(panel) = self.first_panel_under(parent) {
                    return Ok(panel);
                }
                let row = match last_row {
                    Some(row) => row,
                    None => self.add_row(parent, None)?,
                };
                self.panel_for_new_tab(&row)
            }
            TileKind::Tab(_) | TileKind::Content(_) => Err(LayoutError::hierarchy(
                "tabs may only be added to panels, columns, rows or grids",
            )),
        }
    }

    fn first_panel_under(&self, id: &TileId) -> Option<TileId> {
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            let tile = self.get(&current)?;
            if tile.tile_type() == TileType::Panel {
                return Some(current);
            }
            for child in tile.child_ids().into_iter().rev() {
                stack.push(child.clone());
            }
        }
        None
    }

    fn insert_tab(&mut self, panel: &TileId, name: &str, options: TabOptions) -> TileId {
        let tab = self.store_mut().add(
            None,
            Some(panel.clone()),
            TileKind::Tab(Tab {
                name: name.to_string(),
                content: None,
                is_lazy: options.is_lazy,
            }),
        );
        let content = self.store_mut().add(
            None,
            Some(tab.clone()),
            TileKind::Content(Content::default()),
        );
        self.store_mut().update(&tab, |t| {
            if let Some(tab) = t.as_tab_mut() {
                tab.content = Some(content.clone());
            }
        });
        let mut activated = false;
        self.store_mut().update(panel, |t| {
            if let Some(p) = t.as_panel_mut() {
                p.tabs.push(tab.clone());
                if options.make_active || p.active_tab.is_none() {
                    p.active_tab = Some(tab.clone());
                    activated = true;
                }
            }
        });
        if options.make_active || (activated && self.focused_tab().is_none()) {
            self.focus_mut().select(panel.clone(), tab.clone());
        }
        tracing::debug!(tab_id = %tab, panel_id = %panel, name, "add tab");
        tab
    }

    /// Move `tab` into `target` at `target_index` (appended when `None`).
    /// The tab becomes the target's active tab and the focused tab; the
    /// source panel is cleaned up if this emptied it.
    pub fn move_tab(&mut self, tab: &TileId, target: &TileId, target_index: Option<usize>) -> Result<()> {
        self.expect_type(tab, TileType::Tab, "only tabs can be moved")?;
        self.expect_type(target, TileType::Panel, "tabs may only be moved into panels")?;
        let source = self.owning_panel(tab)?;
        self.atomically(|layout| {
            if &source == target {
                let tabs = layout.panel_tabs(target)?;
                let from = position(&tabs, tab)?;
                let to = target_index.unwrap_or(tabs.len()).min(tabs.len() - 1);
                layout.reorder_tabs(target, from, to)?;
                return layout.select_tab(tab);
            }

            let source_tabs = layout.panel_tabs(&source)?;
            let index = position(&source_tabs, tab)?;
            layout.store_mut().update(&source, |t| {
                if let Some(p) = t.as_panel_mut() {
                    p.tabs.remove(index);
                    if p.active_tab.as_ref() == Some(tab) {
                        p.active_tab = neighbour(&p.tabs, index);
                    }
                }
            });
            layout.store_mut().update(target, |t| {
                if let Some(p) = t.as_panel_mut() {
                    let at = target_index.unwrap_or(p.tabs.len()).min(p.tabs.len());
                    p.tabs.insert(at, tab.clone());
                    p.active_tab = Some(tab.clone());
                }
            });
            layout.store_mut().update(tab, |t| t.parent = Some(target.clone()));
            layout.focus_mut().select(target.clone(), tab.clone());
            tracing::debug!(tab_id = %tab, from = %source, to = %target, "move tab");
            layout.cleanup(&source);
            layout.reconcile_focus();
            Ok(())
        })
    }

    /// Close `tab` and its content. The panel activates the tab now at the
    /// same index (or the last one), focus moves on if the closed tab held
    /// it, and the panel is cleaned up if it is now empty.
    pub fn close_tab(&mut self, tab: &TileId) -> Result<()> {
        self.expect_type(tab, TileType::Tab, "only tabs can be closed")?;
        let panel = self.owning_panel(tab)?;
        self.atomically(|layout| {
            let tabs = layout.panel_tabs(&panel)?;
            let index = position(&tabs, tab)?;
            let was_active = layout.valid_active_tab(&panel).as_ref() == Some(tab);
            let content = layout.tile(tab)?.as_tab().and_then(|t| t.content.clone());
            if let Some(content) = content {
                layout.store_mut().remove(&content);
            }
            layout.store_mut().remove(tab);

            let mut next = None;
            layout.store_mut().update(&panel, |t| {
                if let Some(p) = t.as_panel_mut() {
                    if was_active || p.active_tab.is_none() {
                        p.active_tab = neighbour(&p.tabs, index);
                    }
                    next = p.active_tab.clone();
                }
            });
            layout.refocus_after_close(tab, &panel, next);
            tracing::debug!(tab_id = %tab, panel_id = %panel, "close tab");
            layout.cleanup(&panel);
            layout.reconcile_focus();
            Ok(())
        })
    }

    /// Move the tab at `from` to `to` within one panel.
    pub fn reorder_tabs(&mut self, panel: &TileId, from: usize, to: usize) -> Result<()> {
        let tabs = self.panel_tabs(panel)?;
        if from >= tabs.len() || to >= tabs.len() {
            return Err(LayoutError::invalid(format!(
                "tab index out of range: {from} -> {to} with {} tabs",
                tabs.len()
            )));
        }
        self.store_mut().update(panel, |t| {
            if let Some(p) = t.as_panel_mut() {
                let moved = p.tabs.remove(from);
                p.tabs.insert(to, moved);
            }
        });
        Ok(())
    }

    pub fn rename_tab(&mut self, tab: &TileId, name: &str) -> Result<()> {
        self.expect_type(tab, TileType::Tab, "only tabs can be renamed")?;
        self.store_mut().update(tab, |t| {
            if let Some(tab) = t.as_tab_mut() {
                tab.name = name.to_string();
            }
        });
        Ok(())
    }

    /// Point the content of `tab` at a registered component.
    pub fn set_tab_content(
        &mut self,
        tab: &TileId,
        component_id: Option<&str>,
        data: Map<String, Value>,
    ) -> Result<TileId> {
        let existing = self
            .expect_type(tab, TileType::Tab, "content belongs to tabs")?
            .as_tab()
            .and_then(|t| t.content.clone())
            .filter(|c| self.store().contains(c));
        let kind = TileKind::Content(Content {
            component_id: component_id.map(str::to_string),
            data,
        });
        match existing {
            Some(content) => {
                self.store_mut().update(&content, |t| t.kind = kind);
                Ok(content)
            }
            None => {
                let content = self.store_mut().add(None, Some(tab.clone()), kind);
                self.store_mut().update(tab, |t| {
                    if let Some(tab) = t.as_tab_mut() {
                        tab.content = Some(content.clone());
                    }
                });
                Ok(content)
            }
        }
    }

    /// Set the height of a row or the width of a column. Siblings keep their
    /// sizes; the resolver normalizes percentages at layout time.
    pub fn resize(&mut self, id: &TileId, spec: SizeSpec) -> Result<()> {
        let tile = self.tile(id)?;
        if tile.size().is_none() {
            return Err(LayoutError::hierarchy(format!(
                "only rows and columns can be resized (got {} `{id}`)",
                tile.tile_type()
            )));
        }
        self.store_mut().update(id, |t| {
            t.set_size(spec);
        });
        Ok(())
    }

    /// Exempt a tile from cleanup, or make it eligible again.
    pub fn set_pinned(&mut self, id: &TileId, pinned: bool) -> Result<()> {
        self.tile(id)?;
        self.store_mut().update(id, |t| t.pinned = pinned);
        Ok(())
    }

    pub(crate) fn owning_panel(&self, tab: &TileId) -> Result<TileId> {
        let parent = self
            .tile(tab)?
            .parent
            .clone()
            .ok_or_else(|| LayoutError::invalid(format!("tab `{tab}` has no panel")))?;
        self.expect_type(&parent, TileType::Panel, "tabs must live in panels")?;
        Ok(parent)
    }

    pub(crate) fn panel_tabs(&self, panel: &TileId) -> Result<Vec<TileId>> {
        Ok(self
            .expect_type(panel, TileType::Panel, "expected a panel")?
            .as_panel()
            .map(|p| p.tabs.clone())
            .unwrap_or_default())
    }

    fn ensure_column_empty(&self, column: &TileId) -> Result<()> {
        let child = self.tile(column)?.as_column().and_then(|c| c.child.clone());
        match child {
            Some(child) if self.store().contains(&child) => Err(LayoutError::invalid(format!(
                "column `{column}` already holds `{child}`"
            ))),
            _ => Ok(()),
        }
    }

    pub(crate) fn set_column_child(&mut self, column: &TileId, child: &TileId) {
        self.store_mut().update(column, |t| {
            if let Some(c) = t.as_column_mut() {
                c.child = Some(child.clone());
            }
        });
    }

    /// Size for a new sibling along an axis. With no explicit size the new
    /// entry gets `100 / (n + 1)` percent, where `n` counts the percent
    /// siblings, and those siblings are rescaled to fill the rest.
    pub(crate) fn share_axis(&mut self, siblings: &[TileId], explicit: Option<SizeSpec>) -> SizeSpec {
        if let Some(spec) = explicit {
            return spec;
        }
        let sizes: Vec<(TileId, SizeSpec)> = siblings
            .iter()
            .filter_map(|id| Some((id.clone(), self.get(id)?.size()?)))
            .filter(|(_, size)| size.is_percent())
            .collect();
        if sizes.is_empty() {
            return SizeSpec::FULL;
        }
        let share = FULL_PERCENT / (sizes.len() as f64 + 1.0);
        let mut specs: Vec<SizeSpec> = sizes.iter().map(|(_, s)| *s).collect();
        rescale_percent(&mut specs, FULL_PERCENT - share);
        for ((id, old), new) in sizes.iter().zip(specs) {
            if *old != new {
                self.store_mut().update(id, |t| {
                    t.set_size(new);
                });
            }
        }
        SizeSpec::percent(share)
    }
}

fn position(tabs: &[TileId], tab: &TileId) -> Result<usize> {
    tabs.iter()
        .position(|t| t == tab)
        .ok_or_else(|| LayoutError::invalid(format!("tab `{tab}` is not listed by its panel")))
}

/// Tab that takes over after the one at `index` left `tabs`.
fn neighbour(tabs: &[TileId], index: usize) -> Option<TileId> {
    tabs.get(index).or_else(|| tabs.last()).cloned()
}
