//! Native change notifications.
//!
//! A record describes one low-level change as the host saw it at the time it
//! happened. Sibling anchors are captured eagerly; everything else about the
//! surface may have moved on by the time the record is read.

use crate::SurfaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Children were added to or removed from `target`.
    ChildList,
    /// The text of the `target` text node changed.
    CharacterData,
    /// An attribute of the `target` element changed.
    Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: SurfaceId,
    pub added: Vec<SurfaceId>,
    pub removed: Vec<SurfaceId>,
    pub previous_sibling: Option<SurfaceId>,
    pub next_sibling: Option<SurfaceId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub fn child_list(
        target: SurfaceId,
        added: Vec<SurfaceId>,
        removed: Vec<SurfaceId>,
        previous_sibling: Option<SurfaceId>,
        next_sibling: Option<SurfaceId>,
    ) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added,
            removed,
            previous_sibling,
            next_sibling,
            attribute_name: None,
            old_value: None,
        }
    }

    pub fn character_data(target: SurfaceId, old_value: impl Into<String>) -> Self {
        Self {
            kind: MutationKind::CharacterData,
            target,
            added: Vec::new(),
            removed: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            old_value: Some(old_value.into()),
        }
    }

    pub fn attributes(
        target: SurfaceId,
        name: impl Into<String>,
        old_value: Option<String>,
    ) -> Self {
        Self {
            kind: MutationKind::Attributes,
            target,
            added: Vec::new(),
            removed: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: Some(name.into()),
            old_value,
        }
    }
}
