//! UI-only surface content.
//!
//! Transient nodes and attributes never enter the model and never count
//! towards a path index, both when building nodes and when resolving paths
//! against the surface.

use crate::widgets::CARD_LOADING;
use scribe_surface::{Surface, SurfaceId};
use std::collections::BTreeSet;

/// Presence marks an element (and its subtree) as UI-only.
pub const TRANSIENT_ELEMENT: &str = "data-transient-element";
/// Comma separated list of extra UI-only attribute names on this element.
pub const TRANSIENT_ATTRIBUTES: &str = "data-transient-attributes";
/// Selection markers are tagged with this attribute.
pub const SELECTION_MARKER: &str = "data-element";
const SELECTION_MARKERS: &[&str] = &["cursor", "anchor", "focus"];

#[derive(Debug, Clone)]
pub struct Transient {
    attributes: BTreeSet<String>,
}

impl Transient {
    pub fn new<I, S>(extra_attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut attributes: BTreeSet<String> =
            extra_attributes.into_iter().map(Into::into).collect();
        attributes.insert(CARD_LOADING.to_string());
        attributes.insert(TRANSIENT_ATTRIBUTES.to_string());
        Self { attributes }
    }

    pub fn is_transient_node(&self, surface: &Surface, node: SurfaceId) -> bool {
        if !surface.is_element(node) {
            return false;
        }
        surface.attribute(node, TRANSIENT_ELEMENT).is_some()
            || surface
                .attribute(node, SELECTION_MARKER)
                .is_some_and(|marker| SELECTION_MARKERS.contains(&marker))
    }

    /// Whether `node` or any of its ancestors is transient.
    pub fn is_within_transient(&self, surface: &Surface, node: SurfaceId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.is_transient_node(surface, id) {
                return true;
            }
            current = surface.parent(id);
        }
        false
    }

    pub fn is_transient_attribute(&self, surface: &Surface, node: SurfaceId, name: &str) -> bool {
        if self.attributes.contains(name) {
            return true;
        }
        surface
            .attribute(node, TRANSIENT_ATTRIBUTES)
            .is_some_and(|list| list.split(',').any(|item| item.trim() == name))
    }

    /// Children of `node` that take part in the model, in surface order.
    pub fn children(&self, surface: &Surface, node: SurfaceId) -> Vec<SurfaceId> {
        surface
            .children(node)
            .iter()
            .copied()
            .filter(|child| !self.is_transient_node(surface, *child))
            .collect()
    }

    /// Nearest non-transient sibling before `node`.
    pub fn previous_sibling(&self, surface: &Surface, node: SurfaceId) -> Option<SurfaceId> {
        let mut current = surface.previous_sibling(node);
        while let Some(id) = current {
            if !self.is_transient_node(surface, id) {
                return Some(id);
            }
            current = surface.previous_sibling(id);
        }
        None
    }

    /// Nearest non-transient sibling after `node`.
    pub fn next_sibling(&self, surface: &Surface, node: SurfaceId) -> Option<SurfaceId> {
        let mut current = surface.next_sibling(node);
        while let Some(id) = current {
            if !self.is_transient_node(surface, id) {
                return Some(id);
            }
            current = surface.next_sibling(id);
        }
        None
    }
}

impl Default for Transient {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_with_cursor() -> (Surface, SurfaceId, SurfaceId, SurfaceId) {
        let mut surface = Surface::new("div");
        let a = surface.create_text("a");
        let cursor = surface.create_element("span");
        surface.set_attribute(cursor, SELECTION_MARKER, "cursor").unwrap();
        let b = surface.create_text("b");
        let root = surface.root();
        surface.append_child(root, a).unwrap();
        surface.append_child(root, cursor).unwrap();
        surface.append_child(root, b).unwrap();
        (surface, a, cursor, b)
    }

    #[test]
    fn test_selection_markers_are_skipped() {
        let (surface, a, cursor, b) = surface_with_cursor();
        let transient = Transient::default();

        assert!(transient.is_transient_node(&surface, cursor));
        assert_eq!(transient.children(&surface, surface.root()), vec![a, b]);
        assert_eq!(transient.next_sibling(&surface, a), Some(b));
        assert_eq!(transient.previous_sibling(&surface, b), Some(a));
    }

    #[test]
    fn test_transient_attributes() {
        let mut surface = Surface::new("div");
        let p = surface.create_element("p");
        surface.set_attribute(p, TRANSIENT_ATTRIBUTES, "data-hover, data-x").unwrap();
        let transient = Transient::new(["data-selected"]);

        assert!(transient.is_transient_attribute(&surface, p, "data-hover"));
        assert!(transient.is_transient_attribute(&surface, p, "data-x"));
        assert!(transient.is_transient_attribute(&surface, p, "data-selected"));
        assert!(transient.is_transient_attribute(&surface, p, CARD_LOADING));
        assert!(transient.is_transient_attribute(&surface, p, TRANSIENT_ATTRIBUTES));
        assert!(!transient.is_transient_attribute(&surface, p, "class"));
    }
}
