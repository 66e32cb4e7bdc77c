//! Semantic classification of element types.
//!
//! The engine never validates edits; it only asks the schema what kind of
//! region an element is and caches the answer on the stored node.

use crate::node::Attributes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Block,
    Inline,
    Mark,
    Unknown,
}

/// Cached schema answer for one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: NodeKind,
    pub void: bool,
}

pub trait Schema {
    fn classify(&self, ty: &str, attributes: &Attributes) -> NodeKind;

    fn is_void(&self, ty: &str) -> bool;

    fn classification(&self, ty: &str, attributes: &Attributes) -> Classification {
        Classification {
            kind: self.classify(ty, attributes),
            void: self.is_void(ty),
        }
    }
}

/// Small HTML vocabulary used when the host supplies no schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSchema;

const BLOCKS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "ul", "ol", "li", "pre",
    "table", "tr", "td", "th", "hr",
];
const INLINES: &[&str] = &["a", "span", "img", "br"];
const MARKS: &[&str] = &[
    "strong", "b", "em", "i", "u", "s", "del", "code", "sub", "sup", "mark",
];
const VOIDS: &[&str] = &["br", "hr", "img", "input"];

impl Schema for DefaultSchema {
    fn classify(&self, ty: &str, attributes: &Attributes) -> NodeKind {
        if let Some(card_type) = attributes.get(crate::widgets::CARD_TYPE) {
            return if card_type == "inline" {
                NodeKind::Inline
            } else {
                NodeKind::Block
            };
        }
        if BLOCKS.contains(&ty) {
            NodeKind::Block
        } else if MARKS.contains(&ty) {
            NodeKind::Mark
        } else if INLINES.contains(&ty) {
            NodeKind::Inline
        } else {
            NodeKind::Unknown
        }
    }

    fn is_void(&self, ty: &str) -> bool {
        VOIDS.contains(&ty)
    }
}
