//! Tiling layout engine for tabbed-panel workbenches.
//!
//! A [`Layout`] is a tree of tiles: a root grid holds rows, rows hold
//! columns, a column holds one panel, sub-grid or content tile, and panels
//! hold tabs. Tiles live in a flat store keyed by id. The operations in
//! [`layout`] reshape the tree and keep it minimal, and [`snapshot`] turns
//! it into JSON and back.

pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod layout;
pub mod persist;
pub mod registry;
pub mod size;
pub mod snapshot;
pub mod store;
pub mod tile;
pub mod tracing_sub;

pub use config::LayoutConfig;
pub use error::{LayoutError, Result};
pub use layout::{FocusState, GeometryCache, Layout, RegionMap, SplitDirection, TabOptions};
pub use persist::{JsonFileAdapter, MemoryAdapter, PersistenceAdapter};
pub use registry::ComponentRegistry;
pub use size::{SizeSpec, SizeUnit};
pub use snapshot::SerializedLayout;
pub use tile::{Tile, TileId, TileKind, TileType};
