//! Serialized form of a layout and the checks run when loading one.
//!
//! The wire shape is a flat tile array plus focus metadata:
//!
//! ```json
//! { "tiles": [ { "id": "..", "type": "grid", "parent": null, "rows": [] } ],
//!   "metadata": { "activePanel": null, "focusedActiveTab": null } }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TAB_NAME;
use crate::error::{LayoutError, Result};
use crate::layout::{FocusState, Layout};
use crate::store::{TileMap, TileStore};
use crate::tile::{Grid, Tile, TileId, TileKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedLayout {
    pub tiles: Vec<Tile>,
    #[serde(default)]
    pub metadata: LayoutMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMetadata {
    #[serde(default)]
    pub active_panel: Option<TileId>,
    #[serde(default)]
    pub focused_active_tab: Option<TileId>,
}

impl SerializedLayout {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A named check over a deserialized layout. The error string says what
/// was wrong.
#[derive(Clone, Copy)]
pub struct Validator {
    pub name: &'static str,
    check: fn(&SerializedLayout) -> std::result::Result<(), String>,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Validator").field(&self.name).finish()
    }
}

impl Validator {
    pub const fn new(
        name: &'static str,
        check: fn(&SerializedLayout) -> std::result::Result<(), String>,
    ) -> Self {
        Self { name, check }
    }

    pub fn run(&self, layout: &SerializedLayout) -> Result<()> {
        (self.check)(layout).map_err(|reason| LayoutError::LoadValidation {
            validator: self.name,
            reason,
        })
    }
}

pub const SINGLE_ROOT: Validator = Validator::new("single-root", single_root);
pub const UNIQUE_IDS: Validator = Validator::new("unique-ids", unique_ids);
/// Every resolvable child id must point back at the tile listing it. This
/// also rules out reference cycles and tiles with two owners.
pub const PARENT_LINKS: Validator = Validator::new("parent-links", parent_links);
/// Opt-in check that every child id names a tile in the payload.
pub const REFERENCES_RESOLVE: Validator = Validator::new("references-resolve", references_resolve);

pub fn default_validators() -> Vec<Validator> {
    vec![SINGLE_ROOT, UNIQUE_IDS, PARENT_LINKS]
}

/// Run `validators` in order; the first failure wins.
pub fn validate(layout: &SerializedLayout, validators: &[Validator]) -> Result<()> {
    validators.iter().try_for_each(|v| v.run(layout))
}

fn single_root(layout: &SerializedLayout) -> std::result::Result<(), String> {
    match layout.tiles.iter().filter(|t| t.is_root_grid()).count() {
        1 => Ok(()),
        n => Err(format!("expected exactly one root grid, found {n}")),
    }
}

fn unique_ids(layout: &SerializedLayout) -> std::result::Result<(), String> {
    let mut seen = BTreeSet::new();
    for tile in &layout.tiles {
        if !seen.insert(&tile.id) {
            return Err(format!("duplicate tile id `{}`", tile.id));
        }
    }
    Ok(())
}

fn parent_links(layout: &SerializedLayout) -> std::result::Result<(), String> {
    let by_id: BTreeMap<&TileId, &Tile> = layout.tiles.iter().map(|t| (&t.id, t)).collect();
    for tile in &layout.tiles {
        for child in tile.child_ids() {
            let Some(owned) = by_id.get(child) else {
                continue;
            };
            if owned.parent.as_ref() != Some(&tile.id) {
                let parent = owned
                    .parent
                    .as_ref()
                    .map_or_else(|| "none".to_string(), |p| format!("`{p}`"));
                return Err(format!(
                    "`{}` lists `{child}` but its parent is {parent}",
                    tile.id
                ));
            }
        }
    }
    Ok(())
}

fn references_resolve(layout: &SerializedLayout) -> std::result::Result<(), String> {
    let ids: BTreeSet<_> = layout.tiles.iter().map(|t| &t.id).collect();
    for tile in &layout.tiles {
        if let Some(missing) = tile.child_ids().into_iter().find(|c| !ids.contains(c)) {
            return Err(format!("`{}` references missing `{missing}`", tile.id));
        }
    }
    Ok(())
}

fn into_parts(snapshot: SerializedLayout) -> Result<(TileMap, TileId, FocusState)> {
    let root = snapshot
        .tiles
        .iter()
        .find(|t| t.is_root_grid())
        .map(|t| t.id.clone())
        .ok_or_else(|| LayoutError::invalid("snapshot has no root grid"))?;
    let focus = FocusState {
        active_panel: snapshot.metadata.active_panel,
        focused_tab: snapshot.metadata.focused_active_tab,
    };
    let tiles = snapshot
        .tiles
        .into_iter()
        .map(|tile| (tile.id.clone(), tile))
        .collect();
    Ok((tiles, root, focus))
}

impl Layout {
    /// A root grid holding one row, column and panel with a single tab.
    pub fn with_default_tab(name: &str) -> Self {
        let mut layout = Layout::new();
        layout.reset_to_default(name);
        layout
    }

    /// Throw the current tree away and build the minimal default layout.
    pub fn reset_to_default(&mut self, tab_name: &str) {
        let mut store = TileStore::new();
        let root = store.add(None, None, TileKind::Grid(Grid::default()));
        self.replace_contents(store.snapshot(), root.clone(), FocusState::default());
        if let Err(err) = self.add_tab(&root, tab_name) {
            tracing::warn!(error = %err, "failed to build default layout");
        }
    }

    pub fn to_snapshot(&self) -> SerializedLayout {
        SerializedLayout {
            tiles: self.store().iter().cloned().collect(),
            metadata: LayoutMetadata {
                active_panel: self.active_panel().cloned(),
                focused_active_tab: self.focused_tab().cloned(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    pub fn from_snapshot(snapshot: SerializedLayout) -> Result<Self> {
        Self::from_snapshot_with(snapshot, &default_validators())
    }

    pub fn from_snapshot_with(snapshot: SerializedLayout, validators: &[Validator]) -> Result<Self> {
        validate(&snapshot, validators)?;
        let (tiles, root, focus) = into_parts(snapshot)?;
        let mut store = TileStore::new();
        store.replace_all(tiles);
        let mut layout = Layout::from_parts(store, root, focus);
        layout.reconcile_focus();
        Ok(layout)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_snapshot(SerializedLayout::from_json(json)?)
    }

    /// Replace this layout's tree with `snapshot` after validating it.
    /// On failure nothing changes.
    pub fn load(&mut self, snapshot: SerializedLayout) -> Result<()> {
        validate(&snapshot, &default_validators())?;
        let (tiles, root, focus) = into_parts(snapshot)?;
        self.replace_contents(tiles, root, focus);
        tracing::debug!(tiles = self.store().len(), "layout loaded");
        Ok(())
    }

    /// Load `snapshot`, or fall back to the default layout if it is
    /// rejected. The rejection is logged and sent to error listeners.
    /// Returns whether the snapshot was used.
    pub fn load_or_default(&mut self, snapshot: SerializedLayout) -> bool {
        let loaded = self.load(snapshot);
        self.accept_or_default(loaded)
    }

    /// Like [`Layout::load_or_default`]; unparsable JSON is rejected the
    /// same way as a snapshot that fails validation.
    pub fn load_json_or_default(&mut self, json: &str) -> bool {
        let loaded = SerializedLayout::from_json(json).and_then(|s| self.load(s));
        self.accept_or_default(loaded)
    }

    fn accept_or_default(&mut self, loaded: Result<()>) -> bool {
        match loaded {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, "rejected saved layout; using default");
                self.report_error(&err);
                self.reset_to_default(DEFAULT_TAB_NAME);
                false
            }
        }
    }
}
