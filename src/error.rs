//! Error types shared by the tile store, the mutation operations and the
//! serialization boundary.

use thiserror::Error;

use crate::tile::TileId;

#[derive(Debug, Error)]
pub enum LayoutError {
    /// A mutation would place a tile under a parent kind that cannot own it.
    #[error("hierarchy violation: {0}")]
    HierarchyViolation(String),
    #[error("tile not found: {0}")]
    NotFound(TileId),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// A deserialized layout was rejected by one of the load validators.
    #[error("layout failed validation ({validator}): {reason}")]
    LoadValidation {
        validator: &'static str,
        reason: String,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LayoutError {
    pub(crate) fn hierarchy(msg: impl Into<String>) -> Self {
        Self::HierarchyViolation(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T, E = LayoutError> = std::result::Result<T, E>;
