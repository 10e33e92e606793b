//! Which panel is active and which tab holds keyboard focus.
//!
//! Selecting a tab makes it active inside its panel and makes it the
//! focused tab of the whole layout. When the focused tab goes away the
//! replacement is, in order: a neighbour in the same panel, the active tab
//! of the first other non-empty panel in tree order, or nothing.

use crate::error::Result;
use crate::layout::Layout;
use crate::tile::{TileId, TileType};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusState {
    pub active_panel: Option<TileId>,
    pub focused_tab: Option<TileId>,
}

impl FocusState {
    pub fn select(&mut self, panel: TileId, tab: TileId) {
        self.active_panel = Some(panel);
        self.focused_tab = Some(tab);
    }

    pub fn clear(&mut self) {
        self.active_panel = None;
        self.focused_tab = None;
    }
}

impl Layout {
    /// Make `tab` the active tab of its panel and the focused tab of the
    /// layout.
    pub fn select_tab(&mut self, tab: &TileId) -> Result<()> {
        self.expect_type(tab, TileType::Tab, "only tabs can be selected")?;
        let panel = self.owning_panel(tab)?;
        self.store_mut().update(&panel, |t| {
            if let Some(p) = t.as_panel_mut() {
                p.active_tab = Some(tab.clone());
            }
        });
        tracing::debug!(tab_id = %tab, panel_id = %panel, "select tab");
        self.focus_mut().select(panel, tab.clone());
        Ok(())
    }

    /// Active tab of `panel`, if the panel exists and its active tab is one
    /// of its tabs.
    pub(crate) fn valid_active_tab(&self, panel: &TileId) -> Option<TileId> {
        let p = self.get(panel)?.as_panel()?;
        let active = p.active_tab.as_ref()?;
        (p.tabs.contains(active) && self.store().contains(active)).then(|| active.clone())
    }

    /// First panel in tree order, other than `exclude`, with a valid active
    /// tab.
    pub(crate) fn first_active_elsewhere(&self, exclude: Option<&TileId>) -> Option<(TileId, TileId)> {
        self.panels()
            .into_iter()
            .filter(|panel| Some(*panel) != exclude)
            .find_map(|panel| self.valid_active_tab(panel).map(|tab| (panel.clone(), tab)))
    }

    fn is_live_tab(&self, id: &TileId) -> bool {
        let Some(tile) = self.get(id) else {
            return false;
        };
        if tile.tile_type() != TileType::Tab {
            return false;
        }
        tile.parent
            .as_ref()
            .and_then(|p| self.get(p))
            .and_then(|p| p.as_panel())
            .is_some_and(|p| p.tabs.contains(id))
    }

    /// Replace dangling focus ids with the fallbacks used after loading:
    /// the active panel's active tab, then the first panel with a valid
    /// active tab.
    pub(crate) fn reconcile_focus(&mut self) {
        let mut focus = self.focus().clone();
        if focus
            .focused_tab
            .as_ref()
            .is_some_and(|tab| !self.is_live_tab(tab))
        {
            focus.focused_tab = None;
        }
        if focus
            .active_panel
            .as_ref()
            .is_some_and(|panel| self.get(panel).and_then(|t| t.as_panel()).is_none())
        {
            focus.active_panel = None;
        }

        if focus.focused_tab.is_none() {
            let from_active = focus
                .active_panel
                .as_ref()
                .and_then(|panel| self.valid_active_tab(panel));
            match from_active {
                Some(tab) => focus.focused_tab = Some(tab),
                None => {
                    if let Some((panel, tab)) = self.first_active_elsewhere(None) {
                        focus.active_panel = Some(panel);
                        focus.focused_tab = Some(tab);
                    }
                }
            }
        }

        if let Some(tab) = &focus.focused_tab {
            let owner = self.get(tab).and_then(|t| t.parent.clone());
            if focus.active_panel != owner {
                focus.active_panel = owner;
            }
        }

        if &focus != self.focus() {
            tracing::trace!(?focus, "focus reconciled");
            *self.focus_mut() = focus;
        }
    }

    /// Pick the focus target after `closed` left `panel`. `next_in_panel` is
    /// the tab that became active there, if any.
    pub(crate) fn refocus_after_close(
        &mut self,
        closed: &TileId,
        panel: &TileId,
        next_in_panel: Option<TileId>,
    ) {
        if self.focused_tab() != Some(closed) {
            return;
        }
        match next_in_panel {
            Some(tab) => self.focus_mut().select(panel.clone(), tab),
            None => match self.first_active_elsewhere(Some(panel)) {
                Some((other, tab)) => self.focus_mut().select(other, tab),
                None => self.focus_mut().clear(),
            },
        }
    }
}
