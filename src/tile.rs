//! The tile record and its variants.
//!
//! Every node of a layout is a [`Tile`]: a shared header (`id`, `parent`,
//! `pinned`) plus a [`TileKind`] payload. Containers own their children by
//! listing child ids; `parent` is a plain back reference used for upward
//! lookups only.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::size::SizeSpec;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(String);

impl TileId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Fresh, time-ordered identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TileId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileType {
    Grid,
    Row,
    Column,
    Panel,
    Tab,
    Content,
}

impl fmt::Display for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TileType::Grid => "grid",
            TileType::Row => "row",
            TileType::Column => "column",
            TileType::Panel => "panel",
            TileType::Tab => "tab",
            TileType::Content => "content",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    #[serde(default)]
    pub rows: Vec<TileId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(default)]
    pub height: SizeSpec,
    #[serde(default)]
    pub columns: Vec<TileId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(default)]
    pub width: SizeSpec,
    #[serde(default)]
    pub child: Option<TileId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    #[serde(default)]
    pub tabs: Vec<TileId>,
    #[serde(default)]
    pub active_tab: Option<TileId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub name: String,
    #[serde(default)]
    pub content: Option<TileId>,
    #[serde(default)]
    pub is_lazy: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub component_id: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TileKind {
    Grid(Grid),
    Row(Row),
    Column(Column),
    Panel(Panel),
    Tab(Tab),
    Content(Content),
}

impl TileKind {
    pub fn tile_type(&self) -> TileType {
        match self {
            TileKind::Grid(_) => TileType::Grid,
            TileKind::Row(_) => TileType::Row,
            TileKind::Column(_) => TileType::Column,
            TileKind::Panel(_) => TileType::Panel,
            TileKind::Tab(_) => TileType::Tab,
            TileKind::Content(_) => TileType::Content,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    #[serde(default)]
    pub parent: Option<TileId>,
    /// Pinned containers survive cleanup even when empty.
    #[serde(default, skip_serializing_if = "is_false")]
    pub pinned: bool,
    #[serde(flatten)]
    pub kind: TileKind,
}

impl Tile {
    pub fn new(id: TileId, parent: Option<TileId>, kind: TileKind) -> Self {
        Self {
            id,
            parent,
            pinned: false,
            kind,
        }
    }

    pub fn tile_type(&self) -> TileType {
        self.kind.tile_type()
    }

    pub fn is_root_grid(&self) -> bool {
        matches!(self.kind, TileKind::Grid(_)) && self.parent.is_none()
    }

    /// Ids this tile owns, in order.
    pub fn child_ids(&self) -> Vec<&TileId> {
        match &self.kind {
            TileKind::Grid(grid) => grid.rows.iter().collect(),
            TileKind::Row(row) => row.columns.iter().collect(),
            TileKind::Column(column) => column.child.iter().collect(),
            TileKind::Panel(panel) => panel.tabs.iter().collect(),
            TileKind::Tab(tab) => tab.content.iter().collect(),
            TileKind::Content(_) => Vec::new(),
        }
    }

    /// Drop every reference this tile holds to `id`. Returns true when the
    /// record changed.
    pub(crate) fn strip_reference(&mut self, id: &TileId) -> bool {
        match &mut self.kind {
            TileKind::Grid(grid) => retain_changed(&mut grid.rows, id),
            TileKind::Row(row) => retain_changed(&mut row.columns, id),
            TileKind::Column(column) => {
                if column.child.as_ref() == Some(id) {
                    column.child = None;
                    true
                } else {
                    false
                }
            }
            TileKind::Panel(panel) => {
                let mut changed = retain_changed(&mut panel.tabs, id);
                if panel.active_tab.as_ref() == Some(id) {
                    panel.active_tab = None;
                    changed = true;
                }
                changed
            }
            TileKind::Tab(tab) => {
                if tab.content.as_ref() == Some(id) {
                    tab.content = None;
                    true
                } else {
                    false
                }
            }
            TileKind::Content(_) => false,
        }
    }

    pub fn as_grid(&self) -> Option<&Grid> {
        match &self.kind {
            TileKind::Grid(grid) => Some(grid),
            _ => None,
        }
    }

    pub fn as_row(&self) -> Option<&Row> {
        match &self.kind {
            TileKind::Row(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_column(&self) -> Option<&Column> {
        match &self.kind {
            TileKind::Column(column) => Some(column),
            _ => None,
        }
    }

    pub fn as_panel(&self) -> Option<&Panel> {
        match &self.kind {
            TileKind::Panel(panel) => Some(panel),
            _ => None,
        }
    }

    pub fn as_tab(&self) -> Option<&Tab> {
        match &self.kind {
            TileKind::Tab(tab) => Some(tab),
            _ => None,
        }
    }

    pub fn as_content(&self) -> Option<&Content> {
        match &self.kind {
            TileKind::Content(content) => Some(content),
            _ => None,
        }
    }

    pub(crate) fn as_grid_mut(&mut self) -> Option<&mut Grid> {
        match &mut self.kind {
            TileKind::Grid(grid) => Some(grid),
            _ => None,
        }
    }

    pub(crate) fn as_row_mut(&mut self) -> Option<&mut Row> {
        match &mut self.kind {
            TileKind::Row(row) => Some(row),
            _ => None,
        }
    }

    pub(crate) fn as_column_mut(&mut self) -> Option<&mut Column> {
        match &mut self.kind {
            TileKind::Column(column) => Some(column),
            _ => None,
        }
    }

    pub(crate) fn as_panel_mut(&mut self) -> Option<&mut Panel> {
        match &mut self.kind {
            TileKind::Panel(panel) => Some(panel),
            _ => None,
        }
    }

    pub(crate) fn as_tab_mut(&mut self) -> Option<&mut Tab> {
        match &mut self.kind {
            TileKind::Tab(tab) => Some(tab),
            _ => None,
        }
    }

    pub(crate) fn as_content_mut(&mut self) -> Option<&mut Content> {
        match &mut self.kind {
            TileKind::Content(content) => Some(content),
            _ => None,
        }
    }

    /// Size along the parent's split axis, for rows and columns.
    pub fn size(&self) -> Option<SizeSpec> {
        match &self.kind {
            TileKind::Row(row) => Some(row.height),
            TileKind::Column(column) => Some(column.width),
            _ => None,
        }
    }

    pub(crate) fn set_size(&mut self, spec: SizeSpec) -> bool {
        match &mut self.kind {
            TileKind::Row(row) => {
                row.height = spec;
                true
            }
            TileKind::Column(column) => {
                column.width = spec;
                true
            }
            _ => false,
        }
    }
}

fn retain_changed(ids: &mut Vec<TileId>, id: &TileId) -> bool {
    let before = ids.len();
    ids.retain(|x| x != id);
    ids.len() != before
}
