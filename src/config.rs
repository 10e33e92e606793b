//! Settings for hosts of a layout, loaded from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use ratatui::layout::Rect;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_LOG_LINES, DEFAULT_TAB_NAME};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Name of the tab in the fallback layout built when a saved layout
    /// is rejected.
    pub default_tab_name: String,
    /// Lines kept by the diagnostics ring buffer.
    pub max_log_lines: usize,
    /// Where the layout is saved between runs. No persistence when unset.
    pub persist_path: Option<PathBuf>,
    /// Extent used for geometry when no terminal size is known.
    pub area: AreaConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_tab_name: DEFAULT_TAB_NAME.to_string(),
            max_log_lines: DEFAULT_MAX_LOG_LINES,
            persist_path: None,
            area: AreaConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaConfig {
    pub width: u16,
    pub height: u16,
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            width: 120,
            height: 40,
        }
    }
}

impl AreaConfig {
    pub fn rect(&self) -> Rect {
        Rect {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        }
    }
}

impl LayoutConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
