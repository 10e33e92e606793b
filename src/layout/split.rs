//! Splitting a panel to make room for a tab.
//!
//! Left and right splits halve the target panel's column and insert a
//! sibling column. Top and bottom splits replace the panel in its column
//! with a two-row sub-grid holding the panel and a new one. Either way the
//! tab is placed with [`Layout::move_tab`], which also cleans up the source
//! panel.

use std::fmt;
use std::str::FromStr;

use crate::error::{LayoutError, Result};
use crate::layout::Layout;
use crate::size::SizeSpec;
use crate::tile::{Column, Grid, Panel, Row, TileId, TileKind, TileType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitDirection {
    Left,
    Right,
    Top,
    Bottom,
}

impl SplitDirection {
    fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Whether the new tile goes before the target along the split axis.
    fn inserts_before(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }
}

impl fmt::Display for SplitDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
        })
    }
}

impl FromStr for SplitDirection {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            other => Err(LayoutError::MalformedInput(format!(
                "unknown split direction `{other}`"
            ))),
        }
    }
}

impl Layout {
    /// Split `target` in `direction` and move `tab` into the new panel.
    /// Returns the id of the new panel.
    pub fn split_panel(
        &mut self,
        tab: &TileId,
        target: &TileId,
        direction: SplitDirection,
    ) -> Result<TileId> {
        self.expect_type(tab, TileType::Tab, "only tabs can be split out")?;
        self.expect_type(target, TileType::Panel, "only panels can be split")?;
        let source = self.owning_panel(tab)?;
        if &source == target && self.panel_tabs(target)?.len() <= 1 {
            return Err(LayoutError::invalid(format!(
                "panel `{target}` has a single tab; nothing to split off"
            )));
        }
        let column = self.parent_of_type(target, TileType::Column)?;

        self.atomically(|layout| {
            let panel = if direction.is_horizontal() {
                layout.split_beside(&column, direction)?
            } else {
                layout.split_across(target, &column, direction)?
            };
            tracing::debug!(
                tab_id = %tab,
                target_id = %target,
                panel_id = %panel,
                %direction,
                "split panel"
            );
            layout.move_tab(tab, &panel, None)?;
            Ok(panel)
        })
    }

    fn split_beside(&mut self, column: &TileId, direction: SplitDirection) -> Result<TileId> {
        let row = self.parent_of_type(column, TileType::Row)?;
        let width = self
            .tile(column)?
            .size()
            .unwrap_or_default()
            .halved();
        self.store_mut().update(column, |t| {
            t.set_size(width);
        });
        let index = self.child_index(&row, column)? + usize::from(!direction.inserts_before());
        let (new_column, panel) = self.column_with_panel(&row, width);
        self.store_mut().update(&row, |t| {
            if let Some(r) = t.as_row_mut() {
                r.columns.insert(index, new_column.clone());
            }
        });
        Ok(panel)
    }

    /// Top and bottom splits wrap the panel in place: its column gets a
    /// two-row sub-grid and sibling columns of the same row are untouched.
    fn split_across(
        &mut self,
        target: &TileId,
        column: &TileId,
        direction: SplitDirection,
    ) -> Result<TileId> {
        let child = self.tile(column)?.as_column().and_then(|c| c.child.clone());
        if child.as_ref() != Some(target) {
            return Err(LayoutError::invalid(format!(
                "column `{column}` does not hold panel `{target}`"
            )));
        }
        self.wrap_in_sub_grid(target, column, direction)
    }

    /// Replace `target` inside `column` with a two-row grid holding `target`
    /// and a new empty panel.
    fn wrap_in_sub_grid(
        &mut self,
        target: &TileId,
        column: &TileId,
        direction: SplitDirection,
    ) -> Result<TileId> {
        let grid = self
            .store_mut()
            .add(None, Some(column.clone()), TileKind::Grid(Grid::default()));
        self.set_column_child(column, &grid);

        let half = SizeSpec::percent(50.0);
        let (existing_row, existing_column) = {
            let row = self.bare_row(&grid, half);
            let col = self.bare_column(&row, SizeSpec::FULL);
            self.store_mut().update(&row, |t| {
                if let Some(r) = t.as_row_mut() {
                    r.columns.push(col.clone());
                }
            });
            (row, col)
        };
        self.store_mut()
            .update(target, |t| t.parent = Some(existing_column.clone()));
        self.set_column_child(&existing_column, target);

        let (new_row, panel) = self.row_with_panel(&grid, half);
        let rows = if direction.inserts_before() {
            vec![new_row, existing_row]
        } else {
            vec![existing_row, new_row]
        };
        self.store_mut().update(&grid, |t| {
            if let Some(g) = t.as_grid_mut() {
                g.rows = rows;
            }
        });
        Ok(panel)
    }

    /// A row with one full-width column holding a fresh empty panel.
    fn row_with_panel(&mut self, grid: &TileId, height: SizeSpec) -> (TileId, TileId) {
        let row = self.bare_row(grid, height);
        let (column, panel) = self.column_with_panel(&row, SizeSpec::FULL);
        self.store_mut().update(&row, |t| {
            if let Some(r) = t.as_row_mut() {
                r.columns.push(column);
            }
        });
        (row, panel)
    }

    /// A column with a fresh empty panel. Rows, columns and panels built
    /// here are not linked into their parent's child list; callers do that.
    fn column_with_panel(&mut self, row: &TileId, width: SizeSpec) -> (TileId, TileId) {
        let column = self.bare_column(row, width);
        let panel = self.store_mut().add(
            None,
            Some(column.clone()),
            TileKind::Panel(Panel::default()),
        );
        self.set_column_child(&column, &panel);
        (column, panel)
    }

    fn bare_row(&mut self, grid: &TileId, height: SizeSpec) -> TileId {
        self.store_mut().add(
            None,
            Some(grid.clone()),
            TileKind::Row(Row {
                height,
                columns: Vec::new(),
            }),
        )
    }

    fn bare_column(&mut self, row: &TileId, width: SizeSpec) -> TileId {
        self.store_mut().add(
            None,
            Some(row.clone()),
            TileKind::Column(Column { width, child: None }),
        )
    }

    pub(crate) fn parent_of_type(&self, id: &TileId, ty: TileType) -> Result<TileId> {
        let parent = self
            .tile(id)?
            .parent
            .clone()
            .ok_or_else(|| LayoutError::invalid(format!("`{id}` has no parent")))?;
        self.expect_type(&parent, ty, "unexpected parent")?;
        Ok(parent)
    }

    pub(crate) fn child_index(&self, parent: &TileId, child: &TileId) -> Result<usize> {
        self.tile(parent)?
            .child_ids()
            .into_iter()
            .position(|c| c == child)
            .ok_or_else(|| LayoutError::invalid(format!("`{parent}` does not list `{child}`")))
    }
}
