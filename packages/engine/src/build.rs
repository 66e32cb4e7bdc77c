//! Node construction from the live surface.

use crate::node::Attributes;
use crate::schema::Schema;
use crate::style::normalize_style;
use crate::transient::Transient;
use crate::tree::{NodeData, NodeKey, Tree};
use crate::widgets::Widgets;
use scribe_surface::{Surface, SurfaceData, SurfaceId};
use std::collections::HashMap;

/// Reads surface subtrees into a [`Tree`], binding and classifying every node
/// it creates.
pub struct Builder<'a> {
    surface: &'a Surface,
    schema: &'a dyn Schema,
    widgets: &'a dyn Widgets,
    transient: &'a Transient,
    normalize_styles: bool,
    snapshots: HashMap<SurfaceId, String>,
}

impl<'a> Builder<'a> {
    pub fn new(
        surface: &'a Surface,
        schema: &'a dyn Schema,
        widgets: &'a dyn Widgets,
        transient: &'a Transient,
    ) -> Self {
        Self {
            surface,
            schema,
            widgets,
            transient,
            normalize_styles: true,
            snapshots: HashMap::new(),
        }
    }

    pub fn normalize_styles(mut self, enabled: bool) -> Self {
        self.normalize_styles = enabled;
        self
    }

    pub fn surface(&self) -> &'a Surface {
        self.surface
    }

    pub fn transient(&self) -> &'a Transient {
        self.transient
    }

    /// Text to use for specific text nodes instead of their live content.
    pub fn with_snapshots(mut self, snapshots: HashMap<SurfaceId, String>) -> Self {
        self.snapshots = snapshots;
        self
    }

    /// Build the subtree rooted at `node`, unattached. Returns `None` for
    /// transient nodes and ids the surface does not know.
    ///
    /// `loading` is inherited: everything under a still-loading card is
    /// marked so diffing can keep it out of undo history.
    pub fn build(&self, tree: &mut Tree, node: SurfaceId, loading: bool) -> Option<NodeKey> {
        if self.transient.is_transient_node(self.surface, node) {
            return None;
        }

        match self.surface.data(node).ok()? {
            SurfaceData::Text { text } => {
                let text = self
                    .snapshots
                    .get(&node)
                    .cloned()
                    .unwrap_or_else(|| text.clone());
                let key = tree.alloc(NodeData::Text { text });
                tree.bind(key, node);
                tree.set_loading(key, loading);
                Some(key)
            }
            SurfaceData::Element { tag, attributes } => {
                let attributes = self.attributes(node, attributes);
                let classification = self.schema.classification(tag, &attributes);
                let loading = loading || self.widgets.exclude_from_history(self.surface, node);

                let children: Vec<NodeKey> = self
                    .surface
                    .children(node)
                    .iter()
                    .filter_map(|child| self.build(tree, *child, loading))
                    .collect();

                let key = tree.alloc(NodeData::Element {
                    ty: tag.clone(),
                    attributes,
                    children: Vec::new(),
                });
                tree.set_children(key, children);
                tree.bind(key, node);
                tree.set_classification(key, classification);
                tree.set_loading(key, loading);
                Some(key)
            }
        }
    }

    /// Whether `node` sits under a card that is still rendering.
    pub fn is_under_loading(&self, node: SurfaceId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.widgets.exclude_from_history(self.surface, id) {
                return true;
            }
            current = self.surface.parent(id);
        }
        false
    }

    /// The attributes the model keeps for element `node`, as they are now.
    pub fn element_attributes(&self, node: SurfaceId) -> Option<Attributes> {
        match self.surface.data(node).ok()? {
            SurfaceData::Element { attributes, .. } => Some(self.attributes(node, attributes)),
            SurfaceData::Text { .. } => None,
        }
    }

    fn attributes(&self, node: SurfaceId, live: &[(String, String)]) -> Attributes {
        live.iter()
            .filter(|(name, _)| !self.transient.is_transient_attribute(self.surface, node, name))
            .map(|(name, value)| {
                let value = if self.normalize_styles && name == "style" {
                    normalize_style(value)
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect()
    }
}
