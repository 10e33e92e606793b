//! Where layouts go between sessions.
//!
//! A [`Layout`](crate::Layout) with an adapter saves itself at the end of
//! every frame that changed something (see `Layout::flush_frame`) and
//! reads the saved state back once through `Layout::restore`.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use crate::snapshot::SerializedLayout;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<PersistError> for crate::error::LayoutError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::Io(err) => Self::Io(err),
            PersistError::Json(err) => Self::Json(err),
        }
    }
}

pub trait PersistenceAdapter {
    fn save(&mut self, layout: &SerializedLayout) -> Result<(), PersistError>;

    /// The last saved layout, or `None` if nothing was saved yet.
    fn load(&mut self) -> Result<Option<SerializedLayout>, PersistError>;
}

/// Keeps the saved JSON in memory. Clones share the same slot, so a test
/// can hand one clone to a layout and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    slot: Rc<RefCell<Option<String>>>,
    saves: Rc<RefCell<usize>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(json: impl Into<String>) -> Self {
        let adapter = Self::default();
        *adapter.slot.borrow_mut() = Some(json.into());
        adapter
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn save(&mut self, layout: &SerializedLayout) -> Result<(), PersistError> {
        let json = serde_json::to_string(layout)?;
        *self.slot.borrow_mut() = Some(json);
        *self.saves.borrow_mut() += 1;
        Ok(())
    }

    fn load(&mut self) -> Result<Option<SerializedLayout>, PersistError> {
        match self.slot.borrow().as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }
}

/// Pretty JSON in a file. Writes go to a sibling temp file first and are
/// renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileAdapter {
    path: PathBuf,
}

impl JsonFileAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "layout.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PersistenceAdapter for JsonFileAdapter {
    fn save(&mut self, layout: &SerializedLayout) -> Result<(), PersistError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(layout)?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        tracing::trace!(path = %self.path.display(), "layout saved");
        Ok(())
    }

    fn load(&mut self) -> Result<Option<SerializedLayout>, PersistError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Layout;

    #[test]
    fn memory_adapter_round_trip() {
        let mut adapter = MemoryAdapter::new();
        assert!(adapter.load().unwrap().is_none());
        let layout = Layout::with_default_tab("t");
        adapter.save(&layout.to_snapshot()).unwrap();
        let loaded = adapter.load().unwrap().unwrap();
        assert_eq!(loaded, layout.to_snapshot());
        assert_eq!(adapter.save_count(), 1);
    }

    #[test]
    fn file_adapter_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut adapter = JsonFileAdapter::new(dir.path().join("nested").join("layout.json"));
        assert!(adapter.load().unwrap().is_none());
        let layout = Layout::with_default_tab("t");
        adapter.save(&layout.to_snapshot()).unwrap();
        assert!(adapter.path().exists());
        assert!(!adapter.temp_path().exists());
        assert_eq!(adapter.load().unwrap().unwrap(), layout.to_snapshot());
    }

    #[test]
    fn file_adapter_reports_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        fs::write(&path, "not json").unwrap();
        let err = JsonFileAdapter::new(path).load().unwrap_err();
        assert!(matches!(err, PersistError::Json(_)));
    }
}
