//! Positional node addresses.
//!
//! A path is only meaningful against the tree state it was computed from;
//! any structural change above a node shifts it.

/// Child indices from the root down to a node. The root itself is `[]`.
pub type Path = Vec<usize>;

pub fn child(path: &[usize], index: usize) -> Path {
    let mut out = Vec::with_capacity(path.len() + 1);
    out.extend_from_slice(path);
    out.push(index);
    out
}
