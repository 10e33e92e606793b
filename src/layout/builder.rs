//! Chainable handles over the mutation operations.
//!
//! ```
//! use tile_layout::Layout;
//!
//! let mut layout = Layout::new();
//! let tab = layout
//!     .root_grid()
//!     .row(None)?
//!     .column(None)?
//!     .panel()?
//!     .tab("Notes")?
//!     .id()
//!     .clone();
//! assert_eq!(layout.focused_tab(), Some(&tab));
//! # Ok::<(), tile_layout::LayoutError>(())
//! ```

use serde_json::{Map, Value};

use crate::error::Result;
use crate::layout::{Layout, SplitDirection, TabOptions};
use crate::size::SizeSpec;
use crate::tile::{TileId, TileType};

macro_rules! handle {
    ($name:ident) => {
        #[derive(Debug)]
        pub struct $name<'a> {
            layout: &'a mut Layout,
            id: TileId,
        }

        impl<'a> $name<'a> {
            pub fn id(&self) -> &TileId {
                &self.id
            }

            pub fn layout(&mut self) -> &mut Layout {
                &mut *self.layout
            }

            pub fn pin(self, pinned: bool) -> Result<Self> {
                self.layout.set_pinned(&self.id, pinned)?;
                Ok(self)
            }
        }
    };
}

handle!(GridHandle);
handle!(RowHandle);
handle!(ColumnHandle);
handle!(PanelHandle);
handle!(TabHandle);

impl Layout {
    pub fn root_grid(&mut self) -> GridHandle<'_> {
        let id = self.root_id().clone();
        GridHandle { layout: self, id }
    }

    pub fn grid(&mut self, id: &TileId) -> Result<GridHandle<'_>> {
        self.expect_type(id, TileType::Grid, "not a grid")?;
        Ok(GridHandle {
            layout: self,
            id: id.clone(),
        })
    }

    pub fn panel(&mut self, id: &TileId) -> Result<PanelHandle<'_>> {
        self.expect_type(id, TileType::Panel, "not a panel")?;
        Ok(PanelHandle {
            layout: self,
            id: id.clone(),
        })
    }
}

impl<'a> GridHandle<'a> {
    pub fn row(self, height: Option<SizeSpec>) -> Result<RowHandle<'a>> {
        let id = self.layout.add_row(&self.id, height)?;
        Ok(RowHandle {
            layout: self.layout,
            id,
        })
    }

    /// Add a tab somewhere in this grid, creating the missing containers.
    pub fn tab(self, name: &str) -> Result<TabHandle<'a>> {
        let id = self.layout.add_tab(&self.id, name)?;
        Ok(TabHandle {
            layout: self.layout,
            id,
        })
    }
}

impl<'a> RowHandle<'a> {
    pub fn column(self, width: Option<SizeSpec>) -> Result<ColumnHandle<'a>> {
        let id = self.layout.add_column(&self.id, width)?;
        Ok(ColumnHandle {
            layout: self.layout,
            id,
        })
    }

    /// Add a column and come back to this row.
    pub fn with_column(
        self,
        width: Option<SizeSpec>,
        build: impl FnOnce(ColumnHandle<'_>) -> Result<()>,
    ) -> Result<Self> {
        let id = self.layout.add_column(&self.id, width)?;
        build(ColumnHandle {
            layout: &mut *self.layout,
            id,
        })?;
        Ok(self)
    }
}

impl<'a> ColumnHandle<'a> {
    pub fn panel(self) -> Result<PanelHandle<'a>> {
        let id = self.layout.add_panel(&self.id)?;
        Ok(PanelHandle {
            layout: self.layout,
            id,
        })
    }

    pub fn grid(self) -> Result<GridHandle<'a>> {
        let id = self.layout.add_grid(Some(&self.id))?;
        Ok(GridHandle {
            layout: self.layout,
            id,
        })
    }

    pub fn content(self, component_id: &str, data: Map<String, Value>) -> Result<TileId> {
        self.layout.add_content(&self.id, Some(component_id), data)
    }

    pub fn resize(self, width: SizeSpec) -> Result<Self> {
        self.layout.resize(&self.id, width)?;
        Ok(self)
    }
}

impl<'a> PanelHandle<'a> {
    pub fn tab(self, name: &str) -> Result<TabHandle<'a>> {
        self.tab_with(name, TabOptions::default())
    }

    pub fn tab_with(self, name: &str, options: TabOptions) -> Result<TabHandle<'a>> {
        let id = self.layout.add_tab_with(&self.id, name, options)?;
        Ok(TabHandle {
            layout: self.layout,
            id,
        })
    }

    /// Add a tab and stay on the panel.
    pub fn with_tab(self, name: &str, options: TabOptions) -> Result<Self> {
        self.layout.add_tab_with(&self.id, name, options)?;
        Ok(self)
    }

    pub fn tabs(&self) -> Vec<TileId> {
        self.layout.panel_tabs(&self.id).unwrap_or_default()
    }
}

impl<'a> TabHandle<'a> {
    pub fn rename(self, name: &str) -> Result<Self> {
        self.layout.rename_tab(&self.id, name)?;
        Ok(self)
    }

    pub fn content(self, component_id: &str, data: Map<String, Value>) -> Result<Self> {
        self.layout
            .set_tab_content(&self.id, Some(component_id), data)?;
        Ok(self)
    }

    pub fn select(self) -> Result<Self> {
        self.layout.select_tab(&self.id)?;
        Ok(self)
    }

    pub fn move_to(self, panel: &TileId, index: Option<usize>) -> Result<Self> {
        self.layout.move_tab(&self.id, panel, index)?;
        Ok(self)
    }

    /// Split `panel` and move this tab into the new half.
    pub fn split_into(self, panel: &TileId, direction: SplitDirection) -> Result<PanelHandle<'a>> {
        let id = self.layout.split_panel(&self.id, panel, direction)?;
        Ok(PanelHandle {
            layout: self.layout,
            id,
        })
    }

    pub fn close(self) -> Result<()> {
        self.layout.close_tab(&self.id)
    }
}
