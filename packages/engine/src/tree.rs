//! # Stored Tree
//!
//! The façade's mirror of the surface. Each node lives in a slot that also
//! carries what the model needs but the owned [`Node`] value does not:
//!
//! - parent + index, so a path is computed on demand instead of stored
//! - the surface node it is bound to (and the reverse index)
//! - the cached schema classification
//! - whether it was built under a still-loading card
//!
//! Bindings never outlive the slot that owns them: freeing a slot drops its
//! binding unless the surface node has already been rebound to a newer slot.

use crate::errors::ApplyError;
use crate::node::{Attributes, Node};
use crate::operation::{apply_properties, insert_chars, remove_chars, Operation};
use crate::path::Path;
use crate::schema::{Classification, Schema};
use scribe_surface::SurfaceId;
use std::collections::HashMap;
use std::ops::Range;

/// Identity of a stored node. Never reused within one tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element {
        ty: String,
        attributes: Attributes,
        children: Vec<NodeKey>,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeKey>,
    index: usize,
    surface: Option<SurfaceId>,
    classification: Option<Classification>,
    loading: bool,
}

#[derive(Debug, Default)]
pub struct Tree {
    slots: HashMap<NodeKey, Slot>,
    next_key: u32,
    root: Option<NodeKey>,
    bindings: HashMap<SurfaceId, NodeKey>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree whose root is a copy of `node`, with no surface bindings.
    pub fn from_node(node: &Node) -> Self {
        let mut tree = Self::new();
        let root = tree.insert_detached(node);
        tree.root = Some(root);
        tree
    }

    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    /// Replace the root, freeing the previous one.
    pub fn set_root(&mut self, root: NodeKey) {
        if let Some(old) = self.root.replace(root) {
            if old != root {
                self.free(old);
            }
        }
        if let Some(slot) = self.slots.get_mut(&root) {
            slot.parent = None;
            slot.index = 0;
        }
    }

    /// Drop every node and binding.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.bindings.clear();
        self.root = None;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.slots.contains_key(&key)
    }

    // Allocation

    /// Allocate a node with no parent and no children.
    pub fn alloc(&mut self, data: NodeData) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        self.slots.insert(
            key,
            Slot {
                data,
                parent: None,
                index: 0,
                surface: None,
                classification: None,
                loading: false,
            },
        );
        key
    }

    /// Copy an owned subtree in, unattached.
    pub fn insert_detached(&mut self, node: &Node) -> NodeKey {
        match node {
            Node::Text { text } => self.alloc(NodeData::Text { text: text.clone() }),
            Node::Element {
                ty,
                attributes,
                children,
            } => {
                let child_keys: Vec<NodeKey> =
                    children.iter().map(|child| self.insert_detached(child)).collect();
                let key = self.alloc(NodeData::Element {
                    ty: ty.clone(),
                    attributes: attributes.clone(),
                    children: Vec::new(),
                });
                self.set_children(key, child_keys);
                key
            }
        }
    }

    /// Attach `children` to a freshly allocated element.
    pub fn set_children(&mut self, parent: NodeKey, children: Vec<NodeKey>) {
        for (index, child) in children.iter().enumerate() {
            self.set_path(*child, parent, index);
        }
        if let Some(NodeData::Element { children: slot_children, .. }) =
            self.slots.get_mut(&parent).map(|slot| &mut slot.data)
        {
            *slot_children = children;
        }
    }

    /// Drop a subtree and every binding still pointing into it.
    pub fn free(&mut self, key: NodeKey) {
        let Some(slot) = self.slots.remove(&key) else {
            return;
        };
        if let Some(surface) = slot.surface {
            if self.bindings.get(&surface) == Some(&key) {
                self.bindings.remove(&surface);
            }
        }
        if let NodeData::Element { children, .. } = slot.data {
            for child in children {
                self.free(child);
            }
        }
    }

    // Path bookkeeping

    /// Record that `key` now sits at `index` under `parent`.
    pub fn set_path(&mut self, key: NodeKey, parent: NodeKey, index: usize) {
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.parent = Some(parent);
            slot.index = index;
        }
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.slots.get(&key)?.parent
    }

    pub fn index(&self, key: NodeKey) -> Option<usize> {
        self.slots.get(&key).map(|slot| slot.index)
    }

    /// Walk parent links up to the root. `None` when `key` is not attached
    /// under the root.
    pub fn get_path(&self, key: NodeKey) -> Option<Path> {
        let mut path = Vec::new();
        let mut current = key;
        loop {
            let slot = self.slots.get(&current)?;
            match slot.parent {
                Some(parent) => {
                    path.push(slot.index);
                    current = parent;
                }
                None if Some(current) == self.root => break,
                None => return None,
            }
        }
        path.reverse();
        Some(path)
    }

    pub fn find(&self, path: &[usize]) -> Option<NodeKey> {
        let mut current = self.root?;
        for index in path {
            current = *self.children(current).get(*index)?;
        }
        Some(current)
    }

    // Reading

    pub fn data(&self, key: NodeKey) -> Option<&NodeData> {
        self.slots.get(&key).map(|slot| &slot.data)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        match self.data(key) {
            Some(NodeData::Element { children, .. }) => children,
            _ => &[],
        }
    }

    pub fn is_element(&self, key: NodeKey) -> bool {
        matches!(self.data(key), Some(NodeData::Element { .. }))
    }

    pub fn classification(&self, key: NodeKey) -> Option<Classification> {
        self.slots.get(&key)?.classification
    }

    pub fn set_classification(&mut self, key: NodeKey, classification: Classification) {
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.classification = Some(classification);
        }
    }

    /// Classify every element of a subtree that has no cached answer yet.
    pub fn classify_subtree(&mut self, key: NodeKey, schema: &dyn Schema) {
        let classification = match self.data(key) {
            Some(NodeData::Element { ty, attributes, .. }) if self.classification(key).is_none() => {
                Some(schema.classification(ty, attributes))
            }
            _ => None,
        };
        if let Some(classification) = classification {
            self.set_classification(key, classification);
        }
        for child in self.children(key).to_vec() {
            self.classify_subtree(child, schema);
        }
    }

    pub fn is_loading(&self, key: NodeKey) -> bool {
        self.slots.get(&key).is_some_and(|slot| slot.loading)
    }

    pub fn set_loading(&mut self, key: NodeKey, loading: bool) {
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.loading = loading;
        }
    }

    /// Owned copy of a subtree.
    pub fn node(&self, key: NodeKey) -> Option<Node> {
        match self.data(key)? {
            NodeData::Text { text } => Some(Node::Text { text: text.clone() }),
            NodeData::Element {
                ty,
                attributes,
                children,
            } => Some(Node::Element {
                ty: ty.clone(),
                attributes: attributes.clone(),
                children: children
                    .iter()
                    .filter_map(|child| self.node(*child))
                    .collect(),
            }),
        }
    }

    // Bindings

    pub fn bind(&mut self, key: NodeKey, surface: SurfaceId) {
        if let Some(slot) = self.slots.get_mut(&key) {
            if let Some(previous) = slot.surface.replace(surface) {
                if previous != surface && self.bindings.get(&previous) == Some(&key) {
                    self.bindings.remove(&previous);
                }
            }
            self.bindings.insert(surface, key);
        }
    }

    pub fn key_for(&self, surface: SurfaceId) -> Option<NodeKey> {
        self.bindings.get(&surface).copied()
    }

    pub fn surface_of(&self, key: NodeKey) -> Option<SurfaceId> {
        self.slots.get(&key)?.surface
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    // Structural edits

    /// Replace `parent`'s children in `range` with `replacement`, free the
    /// replaced subtrees and renumber every sibling from the splice point on.
    pub fn splice(&mut self, parent: NodeKey, range: Range<usize>, replacement: Vec<NodeKey>) {
        let start = range.start;
        let removed: Vec<NodeKey> = match self.slots.get_mut(&parent).map(|slot| &mut slot.data) {
            Some(NodeData::Element { children, .. }) => {
                let end = range.end.min(children.len());
                let start = start.min(end);
                children.splice(start..end, replacement).collect()
            }
            _ => return,
        };
        for key in removed {
            self.free(key);
        }
        self.renumber(parent, start);
    }

    fn renumber(&mut self, parent: NodeKey, from: usize) {
        let children = self.children(parent).to_vec();
        for (index, child) in children.into_iter().enumerate().skip(from) {
            self.set_path(child, parent, index);
        }
    }

    /// Apply an operation to the stored tree. Returns the key of an inserted
    /// node so the caller can bind and classify it.
    pub fn apply(&mut self, operation: &Operation) -> Result<Option<NodeKey>, ApplyError> {
        match operation {
            Operation::InsertNode { path, node, .. } => {
                let (index, parent_path) =
                    path.split_last().ok_or(ApplyError::Root("inserted"))?;
                let parent = self
                    .find(parent_path)
                    .ok_or_else(|| ApplyError::PathNotFound(path.clone()))?;
                if !self.is_element(parent) {
                    return Err(ApplyError::NotAnElement(parent_path.to_vec()));
                }
                if *index > self.children(parent).len() {
                    return Err(ApplyError::PathNotFound(path.clone()));
                }
                let key = self.insert_detached(node);
                self.splice(parent, *index..*index, vec![key]);
                Ok(Some(key))
            }

            Operation::RemoveNode { path, .. } => {
                let (index, parent_path) = path.split_last().ok_or(ApplyError::Root("removed"))?;
                let parent = self
                    .find(parent_path)
                    .ok_or_else(|| ApplyError::PathNotFound(path.clone()))?;
                if *index >= self.children(parent).len() {
                    return Err(ApplyError::PathNotFound(path.clone()));
                }
                self.splice(parent, *index..*index + 1, Vec::new());
                Ok(None)
            }

            Operation::SetNode {
                path,
                properties,
                new_properties,
                ..
            } => {
                let key = self
                    .find(path)
                    .ok_or_else(|| ApplyError::PathNotFound(path.clone()))?;
                match self.slots.get_mut(&key).map(|slot| &mut slot.data) {
                    Some(NodeData::Element { attributes, .. }) => {
                        apply_properties(attributes, properties, new_properties);
                        Ok(None)
                    }
                    _ => Err(ApplyError::NotAnElement(path.clone())),
                }
            }

            Operation::InsertText {
                path, offset, text, ..
            } => {
                let current = self.text_mut(path)?;
                insert_chars(current, *offset, text).ok_or_else(|| {
                    ApplyError::OffsetOutOfRange {
                        path: path.clone(),
                        offset: *offset,
                    }
                })?;
                Ok(None)
            }

            Operation::RemoveText {
                path, offset, text, ..
            } => {
                let current = self.text_mut(path)?;
                remove_chars(current, *offset, text.chars().count()).ok_or_else(|| {
                    ApplyError::OffsetOutOfRange {
                        path: path.clone(),
                        offset: *offset,
                    }
                })?;
                Ok(None)
            }
        }
    }

    fn text_mut(&mut self, path: &Path) -> Result<&mut String, ApplyError> {
        let key = self
            .find(path)
            .ok_or_else(|| ApplyError::PathNotFound(path.clone()))?;
        match self.slots.get_mut(&key).map(|slot| &mut slot.data) {
            Some(NodeData::Text { text }) => Ok(text),
            _ => Err(ApplyError::NotText(path.clone())),
        }
    }
}
