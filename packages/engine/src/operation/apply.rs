//! # Apply
//!
//! Replays operations onto the live surface.
//!
//! Paths are resolved by descending the surface child by child, skipping
//! transient children the same way node construction does. Widget work that
//! follows an edit (render, re-render, content change) is returned as a
//! [`WidgetEffect`] instead of being run here, so the caller can finish its
//! own bookkeeping first.

use super::Operation;
use crate::errors::ApplyError;
use crate::node::Node;
use crate::transient::Transient;
use crate::widgets::{Source, WidgetError, Widgets, CARD_LOADING};
use scribe_surface::{Surface, SurfaceError, SurfaceId};

/// Where a path lands on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// An existing node. `parent` is `None` only for the root.
    Node {
        parent: Option<SurfaceId>,
        node: SurfaceId,
    },
    /// One past the last child of `parent`: valid only as an insert position.
    End { parent: SurfaceId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEffect {
    Render(SurfaceId),
    Rerender(SurfaceId),
    ContentChanged(SurfaceId),
}

impl WidgetEffect {
    pub fn run(
        self,
        widgets: &mut dyn Widgets,
        surface: &mut Surface,
        source: Source,
    ) -> Result<(), WidgetError> {
        match self {
            WidgetEffect::Render(node) => widgets.render(surface, node, source),
            WidgetEffect::Rerender(node) => widgets.rerender(surface, node, source),
            WidgetEffect::ContentChanged(node) => widgets.content_changed(surface, node, source),
        }
    }
}

/// Result of applying one operation to the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    /// The inserted or edited node, when one still exists.
    pub node: Option<SurfaceId>,
    pub effect: Option<WidgetEffect>,
}

pub fn resolve(surface: &Surface, transient: &Transient, path: &[usize]) -> Option<Resolved> {
    let mut current = surface.root();
    let mut parent = None;

    for (depth, index) in path.iter().enumerate() {
        let children = transient.children(surface, current);
        match children.get(*index) {
            Some(child) => {
                parent = Some(current);
                current = *child;
            }
            None if depth + 1 == path.len() && *index == children.len() => {
                return Some(Resolved::End { parent: current });
            }
            None => return None,
        }
    }

    Some(Resolved::Node {
        parent,
        node: current,
    })
}

/// Create detached surface nodes mirroring `node`.
pub fn materialize_into(surface: &mut Surface, node: &Node) -> Result<SurfaceId, SurfaceError> {
    match node {
        Node::Text { text } => Ok(surface.create_text(text.clone())),
        Node::Element {
            ty,
            attributes,
            children,
        } => {
            let element = surface.create_element(ty.clone());
            for (name, value) in attributes {
                surface.set_attribute(element, name.clone(), value.clone())?;
            }
            for child in children {
                let child = materialize_into(surface, child)?;
                surface.append_child(element, child)?;
            }
            Ok(element)
        }
    }
}

/// A fresh, unobserved surface whose root mirrors `root`.
pub fn materialize(root: &Node) -> Result<Surface, ApplyError> {
    let Node::Element {
        ty,
        attributes,
        children,
    } = root
    else {
        return Err(ApplyError::NotAnElement(Vec::new()));
    };

    let mut surface = Surface::new(ty.clone());
    let root_id = surface.root();
    for (name, value) in attributes {
        surface.set_attribute(root_id, name.clone(), value.clone())?;
    }
    for child in children {
        let child = materialize_into(&mut surface, child)?;
        surface.append_child(root_id, child)?;
    }
    Ok(surface)
}

/// Apply one operation to the surface.
pub fn apply_operation(
    surface: &mut Surface,
    transient: &Transient,
    widgets: &mut dyn Widgets,
    operation: &Operation,
    source: Source,
) -> Result<Applied, ApplyError> {
    let path = operation.path();
    let resolved =
        resolve(surface, transient, path).ok_or_else(|| ApplyError::PathNotFound(path.clone()))?;

    match operation {
        Operation::InsertNode { node, .. } => {
            let (parent, reference) = match resolved {
                Resolved::Node {
                    parent: Some(parent),
                    node,
                } => (parent, Some(node)),
                Resolved::Node { parent: None, .. } => return Err(ApplyError::Root("inserted")),
                Resolved::End { parent } => (parent, None),
            };
            if !surface.is_element(parent) {
                return Err(ApplyError::NotAnElement(path[..path.len() - 1].to_vec()));
            }

            let fragment = materialize_into(surface, node)?;
            let effect = if widgets.is_placeholder(surface, fragment) {
                surface.set_attribute(fragment, CARD_LOADING, source.as_str())?;
                Some(WidgetEffect::Render(fragment))
            } else {
                None
            };
            surface.insert_before(parent, fragment, reference)?;

            Ok(Applied {
                node: Some(fragment),
                effect,
            })
        }

        Operation::RemoveNode { .. } => {
            let node = match resolved {
                Resolved::Node {
                    parent: Some(_),
                    node,
                } => node,
                Resolved::Node { parent: None, .. } => return Err(ApplyError::Root("removed")),
                Resolved::End { .. } => return Err(ApplyError::PathNotFound(path.clone())),
            };

            if widgets.is_placeholder(surface, node) {
                widgets.teardown(surface, node, source)?;
            } else {
                surface.remove(node)?;
            }
            Ok(Applied::default())
        }

        Operation::SetNode {
            properties,
            new_properties,
            ..
        } => {
            let Resolved::Node { node, .. } = resolved else {
                return Err(ApplyError::PathNotFound(path.clone()));
            };
            if !surface.is_element(node) {
                return Err(ApplyError::NotAnElement(path.clone()));
            }

            for name in properties.keys() {
                surface.remove_attribute(node, name)?;
            }
            for (name, value) in new_properties {
                match value {
                    Some(value) => surface.set_attribute(node, name.clone(), value.clone())?,
                    None => surface.remove_attribute(node, name)?,
                }
            }

            let effect = if !widgets.is_placeholder(surface, node) {
                None
            } else if widgets.is_editable(surface, node) {
                Some(WidgetEffect::ContentChanged(node))
            } else {
                Some(WidgetEffect::Rerender(node))
            };
            Ok(Applied {
                node: Some(node),
                effect,
            })
        }

        Operation::InsertText { offset, text, .. } => {
            let node = text_node(surface, resolved, path)?;
            surface
                .insert_data(node, *offset, text)
                .map_err(|error| offset_error(error, path, *offset))?;
            Ok(Applied {
                node: Some(node),
                effect: None,
            })
        }

        Operation::RemoveText { offset, text, .. } => {
            let node = text_node(surface, resolved, path)?;
            surface
                .delete_data(node, *offset, text.chars().count())
                .map_err(|error| offset_error(error, path, *offset))?;
            Ok(Applied {
                node: Some(node),
                effect: None,
            })
        }
    }
}

fn text_node(surface: &Surface, resolved: Resolved, path: &[usize]) -> Result<SurfaceId, ApplyError> {
    match resolved {
        Resolved::Node { node, .. } if surface.is_text(node) => Ok(node),
        Resolved::Node { .. } => Err(ApplyError::NotText(path.to_vec())),
        Resolved::End { .. } => Err(ApplyError::PathNotFound(path.to_vec())),
    }
}

fn offset_error(error: SurfaceError, path: &[usize], offset: usize) -> ApplyError {
    match error {
        SurfaceError::OffsetOutOfRange { .. } => ApplyError::OffsetOutOfRange {
            path: path.to_vec(),
            offset,
        },
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transient::SELECTION_MARKER;
    use crate::widgets::{NoWidgets, CARD_EDITABLE, CARD_KEY};

    fn doc() -> Node {
        Node::element("div").with_children(vec![
            Node::element("p").with_child(Node::text("one")),
            Node::element("p").with_child(Node::text("two")),
        ])
    }

    fn apply(surface: &mut Surface, op: &Operation) -> Result<Applied, ApplyError> {
        apply_operation(surface, &Transient::default(), &mut NoWidgets, op, Source::Local)
    }

    #[test]
    fn test_resolve_skips_transient_children() {
        let mut surface = materialize(&doc()).unwrap();
        let root = surface.root();
        let cursor = surface.create_element("span");
        surface.set_attribute(cursor, SELECTION_MARKER, "cursor").unwrap();
        let first = surface.children(root)[0];
        surface.insert_before(root, cursor, Some(first)).unwrap();

        let transient = Transient::default();
        assert_eq!(
            resolve(&surface, &transient, &[0]),
            Some(Resolved::Node {
                parent: Some(root),
                node: first
            })
        );
        assert_eq!(
            resolve(&surface, &transient, &[2]),
            Some(Resolved::End { parent: root })
        );
        assert_eq!(resolve(&surface, &transient, &[3]), None);
        assert_eq!(resolve(&surface, &transient, &[2, 0]), None);
    }

    #[test]
    fn test_insert_and_remove_nodes() {
        let mut surface = materialize(&doc()).unwrap();
        let op = Operation::insert_node(vec![2], Node::element("hr"));
        let applied = apply(&mut surface, &op).unwrap();
        assert_eq!(surface.tag(applied.node.unwrap()), Some("hr"));
        assert_eq!(surface.children(surface.root()).len(), 3);

        apply(&mut surface, &op.inverse()).unwrap();
        assert_eq!(
            surface.to_html(),
            "<div><p>one</p><p>two</p></div>"
        );
    }

    #[test]
    fn test_text_operations_need_text_nodes() {
        let mut surface = materialize(&doc()).unwrap();
        apply(&mut surface, &Operation::insert_text(vec![1, 0], 3, "!")).unwrap();
        apply(&mut surface, &Operation::remove_text(vec![0, 0], 0, "o")).unwrap();
        assert_eq!(surface.to_html(), "<div><p>ne</p><p>two!</p></div>");

        assert!(matches!(
            apply(&mut surface, &Operation::insert_text(vec![0], 0, "x")),
            Err(ApplyError::NotText(_))
        ));
        assert!(matches!(
            apply(&mut surface, &Operation::remove_text(vec![0, 0], 1, "xyz")),
            Err(ApplyError::OffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn test_set_node_replaces_snapshot() {
        let mut surface = materialize(&doc()).unwrap();
        let op = Operation::set_node(
            vec![0],
            crate::operation::Properties::new(),
            crate::operation::Properties::from([("class".to_string(), Some("lead".to_string()))]),
        );
        let applied = apply(&mut surface, &op).unwrap();
        assert_eq!(applied.effect, None);
        assert_eq!(surface.attribute(applied.node.unwrap(), "class"), Some("lead"));

        apply(&mut surface, &op.inverse()).unwrap();
        assert_eq!(surface.attribute(applied.node.unwrap(), "class"), None);
    }

    #[test]
    fn test_placeholders_get_widget_effects() {
        let mut surface = materialize(&doc()).unwrap();
        let card = Node::element("div").with_attr(CARD_KEY, "image");
        let applied = apply_operation(
            &mut surface,
            &Transient::default(),
            &mut NoWidgets,
            &Operation::insert_node(vec![1], card),
            Source::Remote,
        )
        .unwrap();

        let node = applied.node.unwrap();
        assert_eq!(applied.effect, Some(WidgetEffect::Render(node)));
        assert_eq!(surface.attribute(node, CARD_LOADING), Some("remote"));

        let op = Operation::set_node(
            vec![1],
            crate::operation::Properties::new(),
            crate::operation::Properties::from([(CARD_EDITABLE.to_string(), Some("true".to_string()))]),
        );
        let applied = apply(&mut surface, &op).unwrap();
        assert_eq!(applied.effect, Some(WidgetEffect::ContentChanged(node)));
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut surface = materialize(&doc()).unwrap();
        let op = Operation::remove_node(Vec::new(), doc());
        assert!(matches!(apply(&mut surface, &op), Err(ApplyError::Root(_))));
    }
}
