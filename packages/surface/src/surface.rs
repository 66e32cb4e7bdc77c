//! Arena-backed editable surface.
//!
//! Nodes are never freed while the surface lives: a detached node keeps its id
//! and data so late readers (records, bindings) can still inspect it, but it is
//! no longer `is_connected`.

use crate::error::{SurfaceError, SurfaceResult};
use crate::record::MutationRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Stable identity of one surface node for the lifetime of the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Clone)]
struct Slot {
    data: SurfaceData,
    parent: Option<SurfaceId>,
    children: Vec<SurfaceId>,
}

/// The live editable surface: one root element plus everything created on it.
#[derive(Debug)]
pub struct Surface {
    slots: Vec<Slot>,
    root: SurfaceId,
    observed: bool,
    queue: Vec<MutationRecord>,
    composing: bool,
}

impl Surface {
    /// Create a surface whose editable root is an element with `root_tag`.
    pub fn new(root_tag: impl Into<String>) -> Self {
        let mut surface = Self {
            slots: Vec::new(),
            root: SurfaceId(0),
            observed: false,
            queue: Vec::new(),
            composing: false,
        };
        surface.root = surface.create_element(root_tag);
        surface
    }

    pub fn root(&self) -> SurfaceId {
        self.root
    }

    pub fn create_element(&mut self, tag: impl Into<String>) -> SurfaceId {
        self.alloc(SurfaceData::Element {
            tag: tag.into(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> SurfaceId {
        self.alloc(SurfaceData::Text { text: text.into() })
    }

    fn alloc(&mut self, data: SurfaceData) -> SurfaceId {
        let id = SurfaceId(self.slots.len() as u32);
        self.slots.push(Slot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn slot(&self, id: SurfaceId) -> SurfaceResult<&Slot> {
        self.slots
            .get(id.0 as usize)
            .ok_or(SurfaceError::UnknownNode(id))
    }

    fn slot_mut(&mut self, id: SurfaceId) -> SurfaceResult<&mut Slot> {
        self.slots
            .get_mut(id.0 as usize)
            .ok_or(SurfaceError::UnknownNode(id))
    }

    // Reading

    pub fn exists(&self, id: SurfaceId) -> bool {
        (id.0 as usize) < self.slots.len()
    }

    pub fn data(&self, id: SurfaceId) -> SurfaceResult<&SurfaceData> {
        Ok(&self.slot(id)?.data)
    }

    pub fn is_element(&self, id: SurfaceId) -> bool {
        matches!(self.data(id), Ok(SurfaceData::Element { .. }))
    }

    pub fn is_text(&self, id: SurfaceId) -> bool {
        matches!(self.data(id), Ok(SurfaceData::Text { .. }))
    }

    pub fn tag(&self, id: SurfaceId) -> Option<&str> {
        match self.data(id).ok()? {
            SurfaceData::Element { tag, .. } => Some(tag),
            SurfaceData::Text { .. } => None,
        }
    }

    pub fn text(&self, id: SurfaceId) -> Option<&str> {
        match self.data(id).ok()? {
            SurfaceData::Text { text } => Some(text),
            SurfaceData::Element { .. } => None,
        }
    }

    /// Attributes in insertion order; empty for text nodes and unknown ids.
    pub fn attributes(&self, id: SurfaceId) -> &[(String, String)] {
        match self.data(id) {
            Ok(SurfaceData::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, id: SurfaceId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn parent(&self, id: SurfaceId) -> Option<SurfaceId> {
        self.slot(id).ok()?.parent
    }

    pub fn children(&self, id: SurfaceId) -> &[SurfaceId] {
        match self.slot(id) {
            Ok(slot) => &slot.children,
            Err(_) => &[],
        }
    }

    pub fn index_of(&self, id: SurfaceId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    pub fn previous_sibling(&self, id: SurfaceId) -> Option<SurfaceId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn next_sibling(&self, id: SurfaceId) -> Option<SurfaceId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Whether `node` is attached (transitively) to the root.
    pub fn is_connected(&self, node: SurfaceId) -> bool {
        self.contains(self.root, node)
    }

    /// Inclusive ancestry test: a node contains itself.
    pub fn contains(&self, ancestor: SurfaceId, node: SurfaceId) -> bool {
        if !self.exists(node) {
            return false;
        }
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    // Mutating

    pub fn append_child(&mut self, parent: SurfaceId, child: SurfaceId) -> SurfaceResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`. A child that is already attached elsewhere is
    /// detached first, which records its own removal.
    pub fn insert_before(
        &mut self,
        parent: SurfaceId,
        child: SurfaceId,
        reference: Option<SurfaceId>,
    ) -> SurfaceResult<()> {
        if !self.is_element(parent) {
            return Err(if self.exists(parent) {
                SurfaceError::NotAnElement(parent)
            } else {
                SurfaceError::UnknownNode(parent)
            });
        }
        self.slot(child)?;
        if self.contains(child, parent) {
            return Err(SurfaceError::Hierarchy { parent, child });
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(SurfaceError::NotAChild { parent, reference });
            }
            if reference == child {
                return Ok(());
            }
        }

        if self.parent(child).is_some() {
            self.remove(child)?;
        }

        let index = match reference {
            Some(reference) => self
                .children(parent)
                .iter()
                .position(|c| *c == reference)
                .ok_or(SurfaceError::NotAChild { parent, reference })?,
            None => self.children(parent).len(),
        };
        let previous = index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied());

        self.slot_mut(parent)?.children.insert(index, child);
        self.slot_mut(child)?.parent = Some(parent);

        self.record(MutationRecord::child_list(
            parent,
            vec![child],
            Vec::new(),
            previous,
            reference,
        ));
        Ok(())
    }

    /// Detach `node` from its parent. Detaching an unattached node is a no-op.
    pub fn remove(&mut self, node: SurfaceId) -> SurfaceResult<()> {
        let Some(parent) = self.slot(node)?.parent else {
            return Ok(());
        };
        let previous = self.previous_sibling(node);
        let next = self.next_sibling(node);

        self.slot_mut(parent)?.children.retain(|c| *c != node);
        self.slot_mut(node)?.parent = None;

        self.record(MutationRecord::child_list(
            parent,
            Vec::new(),
            vec![node],
            previous,
            next,
        ));
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        node: SurfaceId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> SurfaceResult<()> {
        let name = name.into();
        let value = value.into();
        let SurfaceData::Element { attributes, .. } = &mut self.slot_mut(node)?.data else {
            return Err(SurfaceError::NotAnElement(node));
        };
        let old = match attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                attributes.push((name.clone(), value));
                None
            }
        };
        self.record(MutationRecord::attributes(node, name, old));
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: SurfaceId, name: &str) -> SurfaceResult<()> {
        let SurfaceData::Element { attributes, .. } = &mut self.slot_mut(node)?.data else {
            return Err(SurfaceError::NotAnElement(node));
        };
        let Some(position) = attributes.iter().position(|(key, _)| key == name) else {
            return Ok(());
        };
        let (_, old) = attributes.remove(position);
        self.record(MutationRecord::attributes(node, name, Some(old)));
        Ok(())
    }

    pub fn set_text(&mut self, node: SurfaceId, value: impl Into<String>) -> SurfaceResult<()> {
        let SurfaceData::Text { text } = &mut self.slot_mut(node)?.data else {
            return Err(SurfaceError::NotText(node));
        };
        let old = std::mem::replace(text, value.into());
        self.record(MutationRecord::character_data(node, old));
        Ok(())
    }

    /// Insert `data` at char `offset` of a text node.
    pub fn insert_data(&mut self, node: SurfaceId, offset: usize, data: &str) -> SurfaceResult<()> {
        let current = self.text(node).ok_or(SurfaceError::NotText(node))?;
        let byte = byte_offset(current, offset).ok_or(SurfaceError::OffsetOutOfRange {
            node,
            offset,
            len: current.chars().count(),
        })?;
        let mut next = current.to_string();
        next.insert_str(byte, data);
        self.set_text(node, next)
    }

    /// Delete `count` chars starting at char `offset` of a text node.
    pub fn delete_data(&mut self, node: SurfaceId, offset: usize, count: usize) -> SurfaceResult<()> {
        let current = self.text(node).ok_or(SurfaceError::NotText(node))?;
        let len = current.chars().count();
        let out_of_range = SurfaceError::OffsetOutOfRange { node, offset, len };
        let start = byte_offset(current, offset).ok_or(out_of_range.clone())?;
        let end = byte_offset(current, offset + count).ok_or(out_of_range)?;
        let mut next = current.to_string();
        next.replace_range(start..end, "");
        self.set_text(node, next)
    }

    // Observation

    /// Turn native change recording on or off. Turning it off keeps already
    /// queued records.
    pub fn observe(&mut self, enabled: bool) {
        self.observed = enabled;
    }

    pub fn is_observed(&self) -> bool {
        self.observed
    }

    /// Drain every queued record in the order the changes happened.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.queue)
    }

    pub fn pending_records(&self) -> usize {
        self.queue.len()
    }

    fn record(&mut self, record: MutationRecord) {
        if self.observed {
            trace!(kind = ?record.kind, target = %record.target, "Surface mutation recorded");
            self.queue.push(record);
        }
    }

    // Composition

    pub fn begin_composition(&mut self) {
        self.composing = true;
    }

    pub fn end_composition(&mut self) {
        self.composing = false;
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }
}

/// Byte index of char `offset` in `text`; `offset == len` maps to the end.
pub fn byte_offset(text: &str, offset: usize) -> Option<usize> {
    if offset == 0 {
        return Some(0);
    }
    match text.char_indices().nth(offset) {
        Some((byte, _)) => Some(byte),
        None if text.chars().count() == offset => Some(text.len()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MutationKind;

    #[test]
    fn test_insert_and_remove_record_anchors() {
        let mut surface = Surface::new("div");
        let root = surface.root();
        let a = surface.create_element("p");
        let b = surface.create_element("p");
        surface.append_child(root, a).unwrap();

        surface.observe(true);
        surface.insert_before(root, b, Some(a)).unwrap();
        surface.remove(a).unwrap();

        let records = surface.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, MutationKind::ChildList);
        assert_eq!(records[0].added, vec![b]);
        assert_eq!(records[0].previous_sibling, None);
        assert_eq!(records[0].next_sibling, Some(a));
        assert_eq!(records[1].removed, vec![a]);
        assert_eq!(records[1].previous_sibling, Some(b));
        assert!(!surface.is_connected(a));
        assert!(surface.exists(a));
    }

    #[test]
    fn test_unobserved_changes_are_not_recorded() {
        let mut surface = Surface::new("div");
        let text = surface.create_text("hello");
        surface.append_child(surface.root(), text).unwrap();
        assert_eq!(surface.pending_records(), 0);
    }

    #[test]
    fn test_text_editing_uses_char_offsets() {
        let mut surface = Surface::new("div");
        let text = surface.create_text("héllo");
        surface.insert_data(text, 2, "XY").unwrap();
        assert_eq!(surface.text(text), Some("héXYllo"));
        surface.delete_data(text, 1, 3).unwrap();
        assert_eq!(surface.text(text), Some("hllo"));
        assert!(surface.insert_data(text, 9, "z").is_err());
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut surface = Surface::new("div");
        let outer = surface.create_element("p");
        let inner = surface.create_element("span");
        surface.append_child(outer, inner).unwrap();
        assert!(matches!(
            surface.append_child(inner, outer),
            Err(SurfaceError::Hierarchy { .. })
        ));
    }

    #[test]
    fn test_set_attribute_records_old_value() {
        let mut surface = Surface::new("div");
        let p = surface.create_element("p");
        surface.set_attribute(p, "class", "a").unwrap();
        surface.observe(true);
        surface.set_attribute(p, "class", "b").unwrap();
        let records = surface.take_records();
        assert_eq!(records[0].attribute_name.as_deref(), Some("class"));
        assert_eq!(records[0].old_value.as_deref(), Some("a"));
        assert_eq!(surface.attribute(p, "class"), Some("b"));
    }
}
