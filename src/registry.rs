//! Lookup from a content tile's `componentId` to whatever draws it.
//!
//! The layout never renders anything. A host registers renderers of its
//! own type `R` under a name; [`ComponentRegistry::resolve`] finds the one
//! a content tile asks for and builds its props: registered defaults, then
//! the tile's stored data, then `coreInstance` and `contentTileId`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{LayoutError, Result};
use crate::layout::Layout;
use crate::tile::TileId;

pub const CORE_INSTANCE_PROP: &str = "coreInstance";
pub const CONTENT_TILE_ID_PROP: &str = "contentTileId";

#[derive(Debug, Clone)]
pub struct ComponentDescriptor<R> {
    pub renderer: R,
    pub default_props: Map<String, Value>,
}

/// Renderer plus the props to call it with.
#[derive(Debug)]
pub struct ResolvedComponent<'a, R> {
    pub name: &'a str,
    pub renderer: &'a R,
    pub props: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct ComponentRegistry<R> {
    components: BTreeMap<String, ComponentDescriptor<R>>,
}

impl<R> Default for ComponentRegistry<R> {
    fn default() -> Self {
        Self {
            components: BTreeMap::new(),
        }
    }
}

impl<R> ComponentRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `renderer` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, renderer: R, default_props: Map<String, Value>) {
        let name = name.into();
        tracing::trace!(component = %name, "register component");
        self.components.insert(
            name,
            ComponentDescriptor {
                renderer,
                default_props,
            },
        );
    }

    pub fn unregister(&mut self, name: &str) -> Option<ComponentDescriptor<R>> {
        self.components.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ComponentDescriptor<R>> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.components.keys().map(String::as_str)
    }

    /// Renderer and merged props for `content`. `Ok(None)` when the tile
    /// has no component id (an empty placeholder).
    pub fn resolve<'a>(
        &'a self,
        layout: &Layout,
        content: &TileId,
    ) -> Result<Option<ResolvedComponent<'a, R>>> {
        let tile = layout
            .get(content)
            .ok_or_else(|| LayoutError::NotFound(content.clone()))?;
        let Some(record) = tile.as_content() else {
            return Err(LayoutError::hierarchy(format!(
                "only content tiles render components (got {} `{content}`)",
                tile.tile_type()
            )));
        };
        let Some(component_id) = record.component_id.as_deref() else {
            return Ok(None);
        };
        let Some((name, descriptor)) = self.components.get_key_value(component_id) else {
            return Err(LayoutError::invalid(format!(
                "content `{content}` asks for unregistered component `{component_id}`"
            )));
        };

        let mut props = descriptor.default_props.clone();
        props.extend(record.data.iter().map(|(k, v)| (k.clone(), v.clone())));
        props.insert(
            CORE_INSTANCE_PROP.to_string(),
            Value::from(layout.instance_id()),
        );
        props.insert(
            CONTENT_TILE_ID_PROP.to_string(),
            Value::from(content.as_str()),
        );
        Ok(Some(ResolvedComponent {
            name,
            renderer: &descriptor.renderer,
            props,
        }))
    }
}
