//! # Transform
//!
//! Turns a batch of native mutation records into operations.
//!
//! 1. Every record is normalized to a region: a container plus the siblings
//!    bounding the change inside it (`None` meaning the container's edge).
//! 2. Regions whose containers nest are merged into one, widened until the
//!    set is disjoint.
//! 3. Each region is resolved against the stored tree, the live children
//!    between its anchors are rebuilt, diffed against the stored slice and
//!    spliced in.
//!
//! Regions are processed in order and their base paths are computed after the
//! previous region's splice, so the batch applies sequentially.

use super::diff::diff_children;
use super::{properties, Operation};
use crate::build::Builder;
use crate::transient::Transient;
use crate::tree::{NodeData, NodeKey, Tree};
use scribe_surface::{MutationKind, MutationRecord, Surface, SurfaceId};
use tracing::{debug, warn};

/// A changed stretch of one container's children, exclusive of its anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub container: SurfaceId,
    pub prev: Option<SurfaceId>,
    pub next: Option<SurfaceId>,
}

impl Region {
    pub fn whole(container: SurfaceId) -> Self {
        Self {
            container,
            prev: None,
            next: None,
        }
    }
}

/// Diff every region touched by `records`, updating `tree` in place.
pub fn transform(builder: &Builder, tree: &mut Tree, records: &[MutationRecord]) -> Vec<Operation> {
    let surface = builder.surface();
    let transient = builder.transient();

    let regions: Vec<Region> = records
        .iter()
        .filter_map(|record| normalize(surface, transient, record))
        .collect();
    let regions = coalesce(surface, transient, regions);
    debug!(records = records.len(), regions = regions.len(), "Transforming mutation batch");

    let mut ops = Vec::new();
    let root = surface.root();
    if records
        .iter()
        .any(|record| matches!(record.kind, MutationKind::Attributes) && record.target == root)
    {
        diff_root_attributes(builder, tree, &mut ops);
    }
    for region in regions {
        diff_region(builder, tree, region, &mut ops);
    }
    ops
}

/// The region a single record affects, or `None` when it touches nothing the
/// model mirrors.
pub fn normalize(surface: &Surface, transient: &Transient, record: &MutationRecord) -> Option<Region> {
    match record.kind {
        MutationKind::ChildList => {
            let container = record.target;
            if !surface.is_connected(container) || transient.is_within_transient(surface, container) {
                return None;
            }

            let prev = record.previous_sibling.or_else(|| {
                let first = *record.added.first()?;
                transient.previous_sibling(surface, first)
            });
            let next = record.next_sibling.or_else(|| {
                let last = *record.added.last()?;
                transient.next_sibling(surface, last)
            });

            Some(Region {
                container,
                prev: repair_prev(surface, transient, container, prev),
                next: repair_next(surface, transient, container, next),
            })
        }

        MutationKind::CharacterData | MutationKind::Attributes => {
            let target = record.target;
            if !surface.is_connected(target) || transient.is_within_transient(surface, target) {
                return None;
            }
            if let Some(name) = &record.attribute_name {
                if transient.is_transient_attribute(surface, target, name) {
                    return None;
                }
            }
            // The root has no container; its attributes are diffed on their own
            let container = surface.parent(target)?;
            Some(Region {
                container,
                prev: transient.previous_sibling(surface, target),
                next: transient.next_sibling(surface, target),
            })
        }
    }
}

/// Keep an anchor only if it is still a child of `container`, stepping past
/// transient siblings.
fn repair_prev(
    surface: &Surface,
    transient: &Transient,
    container: SurfaceId,
    anchor: Option<SurfaceId>,
) -> Option<SurfaceId> {
    let anchor = anchor?;
    if surface.parent(anchor) != Some(container) {
        return None;
    }
    if transient.is_transient_node(surface, anchor) {
        return transient.previous_sibling(surface, anchor);
    }
    Some(anchor)
}

fn repair_next(
    surface: &Surface,
    transient: &Transient,
    container: SurfaceId,
    anchor: Option<SurfaceId>,
) -> Option<SurfaceId> {
    let anchor = anchor?;
    if surface.parent(anchor) != Some(container) {
        return None;
    }
    if transient.is_transient_node(surface, anchor) {
        return transient.next_sibling(surface, anchor);
    }
    Some(anchor)
}

/// Merge regions whose containers nest until the set is disjoint. The first
/// occurrence of a container keeps its position in the output.
pub fn coalesce(surface: &Surface, transient: &Transient, regions: Vec<Region>) -> Vec<Region> {
    let mut merged: Vec<Region> = Vec::new();

    for mut region in regions {
        let mut position = None;
        while let Some(index) = merged.iter().position(|other| {
            surface.contains(other.container, region.container)
                || surface.contains(region.container, other.container)
        }) {
            let other = merged.remove(index);
            region = merge(surface, transient, other, region);
            position = Some(position.map_or(index, |p: usize| p.min(index)));
        }
        match position {
            Some(index) => merged.insert(index.min(merged.len()), region),
            None => merged.push(region),
        }
    }

    merged
}

fn merge(surface: &Surface, transient: &Transient, a: Region, b: Region) -> Region {
    if a.container == b.container {
        return Region {
            container: a.container,
            prev: earlier(surface, a.prev, b.prev),
            next: later(surface, a.next, b.next),
        };
    }

    let (outer, inner) = if surface.contains(a.container, b.container) {
        (a, b)
    } else {
        (b, a)
    };

    // Widen the outer region over the child that holds the inner container.
    let mut child = inner.container;
    while let Some(parent) = surface.parent(child) {
        if parent == outer.container {
            break;
        }
        child = parent;
    }

    Region {
        container: outer.container,
        prev: earlier(surface, outer.prev, transient.previous_sibling(surface, child)),
        next: later(surface, outer.next, transient.next_sibling(surface, child)),
    }
}

fn earlier(surface: &Surface, a: Option<SurfaceId>, b: Option<SurfaceId>) -> Option<SurfaceId> {
    let (a, b) = (a?, b?);
    match (surface.index_of(a), surface.index_of(b)) {
        (Some(ia), Some(ib)) => Some(if ia <= ib { a } else { b }),
        _ => None,
    }
}

fn later(surface: &Surface, a: Option<SurfaceId>, b: Option<SurfaceId>) -> Option<SurfaceId> {
    let (a, b) = (a?, b?);
    match (surface.index_of(a), surface.index_of(b)) {
        (Some(ia), Some(ib)) => Some(if ia >= ib { a } else { b }),
        _ => None,
    }
}

/// Where a region sits in both the live and the stored children of its
/// container.
#[derive(Debug, PartialEq, Eq)]
struct Slice {
    live: std::ops::Range<usize>,
    stored: std::ops::Range<usize>,
}

fn slice(
    tree: &Tree,
    parent: NodeKey,
    live: &[SurfaceId],
    region: &Region,
) -> Slice {
    let stored_len = tree.children(parent).len();
    let whole = Slice {
        live: 0..live.len(),
        stored: 0..stored_len,
    };

    let locate = |anchor: SurfaceId| -> Option<(usize, usize)> {
        let key = tree.key_for(anchor)?;
        if tree.parent(key) != Some(parent) {
            return None;
        }
        let stored = tree.index(key)?;
        let live = live.iter().position(|id| *id == anchor)?;
        Some((live, stored))
    };

    let (live_start, stored_start) = match region.prev.and_then(&locate) {
        Some((live, stored)) => (live + 1, stored + 1),
        None => (0, 0),
    };
    let (live_end, stored_end) = match region.next.and_then(&locate) {
        Some((live, stored)) if live >= live_start && stored >= stored_start => (live, stored),
        _ => (live.len(), stored_len),
    };

    if live_start > live_end || stored_start > stored_end {
        return whole;
    }
    Slice {
        live: live_start..live_end,
        stored: stored_start..stored_end,
    }
}

/// Root attributes live outside every region: compare them directly and
/// emit a `set_node` at the empty path.
fn diff_root_attributes(builder: &Builder, tree: &mut Tree, ops: &mut Vec<Operation>) {
    let root = builder.surface().root();
    let Some(key) = tree.root() else {
        return;
    };
    let Some(NodeData::Element { attributes: stored, .. }) = tree.data(key) else {
        return;
    };
    let Some(live) = builder.element_attributes(root) else {
        return;
    };
    if *stored == live {
        return;
    }

    let op = Operation::set_node(Vec::new(), properties(stored), properties(&live))
        .with_undoable(builder.is_under_loading(root));
    if let Err(error) = tree.apply(&op) {
        debug!(%error, "Root attribute change not applied to the model");
        return;
    }
    debug!(attributes = live.len(), "Root attributes diffed");
    ops.push(op);
}

fn diff_region(builder: &Builder, tree: &mut Tree, region: Region, ops: &mut Vec<Operation>) {
    let surface = builder.surface();

    let Some(parent) = tree.key_for(region.container).filter(|key| tree.is_element(*key)) else {
        warn!(container = %region.container, "Region container not in the model yet, deferred");
        return;
    };
    let Some(base) = tree.get_path(parent) else {
        warn!(container = %region.container, "Region container detached from the model, deferred");
        return;
    };

    let live = builder.transient().children(surface, region.container);
    let Slice { live: live_range, stored } = slice(tree, parent, &live, &region);
    let loading = builder.is_under_loading(region.container);

    let old: Vec<NodeKey> = tree.children(parent)[stored.clone()].to_vec();
    let new: Vec<NodeKey> = live[live_range]
        .iter()
        .filter_map(|child| builder.build(tree, *child, loading))
        .collect();

    let before = ops.len();
    diff_children(tree, &base, stored.start, &old, &new, loading, ops);
    debug!(
        container = %region.container,
        path = ?base,
        old = old.len(),
        new = new.len(),
        operations = ops.len() - before,
        "Region diffed"
    );

    tree.splice(parent, stored, new);
}
