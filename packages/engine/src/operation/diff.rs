//! Tree diff between stored nodes.
//!
//! Children are compared index by index. Trailing removals of a level are
//! emitted first and back to front so every path stays valid when the batch is
//! applied in order; in-place changes and trailing insertions follow.

use super::{properties, Operation};
use crate::node::Node;
use crate::path::{self, Path};
use crate::tree::{NodeData, NodeKey, Tree};
use similar::{DiffTag, TextDiff};

/// Diff `old` children (already in the tree at `base`, starting at child
/// index `offset`) against `new` children, appending operations to `ops`.
///
/// `loading` marks every emitted operation as excluded from history.
pub fn diff_children(
    tree: &Tree,
    base: &[usize],
    offset: usize,
    old: &[NodeKey],
    new: &[NodeKey],
    loading: bool,
    ops: &mut Vec<Operation>,
) {
    let mut level = Vec::new();
    let mut removals = Vec::new();

    let max_len = old.len().max(new.len());
    for i in 0..max_len {
        let child_path = path::child(base, offset + i);
        match (old.get(i), new.get(i)) {
            (Some(old_key), Some(new_key)) => {
                diff_node(tree, child_path, *old_key, *new_key, loading, &mut level);
            }
            (None, Some(new_key)) => {
                if let Some(node) = tree.node(*new_key) {
                    let undoable = loading || tree.is_loading(*new_key);
                    level.push(Operation::insert_node(child_path, node).with_undoable(undoable));
                }
            }
            (Some(old_key), None) => {
                if let Some(node) = tree.node(*old_key) {
                    let undoable = loading || tree.is_loading(*old_key);
                    removals.insert(
                        0,
                        Operation::remove_node(child_path, node).with_undoable(undoable),
                    );
                }
            }
            (None, None) => {}
        }
    }

    ops.extend(removals);
    ops.extend(level);
}

fn diff_node(
    tree: &Tree,
    node_path: Path,
    old: NodeKey,
    new: NodeKey,
    loading: bool,
    ops: &mut Vec<Operation>,
) {
    let undoable = loading || tree.is_loading(new);

    match (tree.data(old), tree.data(new)) {
        (
            Some(NodeData::Element {
                ty: old_ty,
                attributes: old_attributes,
                children: old_children,
            }),
            Some(NodeData::Element {
                ty: new_ty,
                attributes: new_attributes,
                children: new_children,
            }),
        ) if old_ty == new_ty => {
            if old_attributes != new_attributes {
                ops.push(
                    Operation::set_node(
                        node_path.clone(),
                        properties(old_attributes),
                        properties(new_attributes),
                    )
                    .with_undoable(undoable),
                );
            }
            diff_children(tree, &node_path, 0, old_children, new_children, undoable, ops);
        }

        (Some(NodeData::Text { text: old_text }), Some(NodeData::Text { text: new_text })) => {
            if old_text != new_text {
                ops.extend(
                    diff_text(&node_path, old_text, new_text)
                        .into_iter()
                        .map(|op| op.with_undoable(undoable)),
                );
            }
        }

        _ => {
            // Kind or type changed: replace
            let (Some(old_node), Some(new_node)) = (tree.node(old), tree.node(new)) else {
                return;
            };
            ops.push(Operation::remove_node(node_path.clone(), old_node).with_undoable(undoable));
            ops.push(Operation::insert_node(node_path, new_node).with_undoable(undoable));
        }
    }
}

/// Char-level text diff as ordered `remove_text`/`insert_text` operations.
///
/// Offsets are taken in the partially patched text: everything before a hunk
/// is already in its new form when the hunk's operations apply.
pub fn diff_text(node_path: &[usize], old: &str, new: &str) -> Vec<Operation> {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();
    let diff = TextDiff::from_chars(old, new);

    let mut ops = Vec::new();
    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        let offset = new_range.start;
        match tag {
            DiffTag::Equal => {}
            DiffTag::Delete => {
                let removed: String = old_chars[old_range].iter().collect();
                ops.push(Operation::remove_text(node_path.to_vec(), offset, removed));
            }
            DiffTag::Insert => {
                let inserted: String = new_chars[new_range].iter().collect();
                ops.push(Operation::insert_text(node_path.to_vec(), offset, inserted));
            }
            DiffTag::Replace => {
                let removed: String = old_chars[old_range].iter().collect();
                let inserted: String = new_chars[new_range].iter().collect();
                ops.push(Operation::remove_text(node_path.to_vec(), offset, removed));
                ops.push(Operation::insert_text(node_path.to_vec(), offset, inserted));
            }
        }
    }
    ops
}

/// Operations turning the children of `old` into the children of `new`.
/// Neither tree needs a surface.
pub fn diff_nodes(old: &Node, new: &Node) -> Vec<Operation> {
    let mut tree = Tree::new();
    let old_root = tree.insert_detached(old);
    let new_root = tree.insert_detached(new);

    let mut ops = Vec::new();
    diff_children(
        &tree,
        &[],
        0,
        tree.children(old_root),
        tree.children(new_root),
        false,
        &mut ops,
    );
    ops
}
