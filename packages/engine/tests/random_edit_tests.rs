//! Randomized edit sequences against the round-trip guarantees
//!
//! This tests:
//! - Every flushed batch replays on the previous tree
//! - The stored tree always equals a fresh rebuild of the surface
//! - The inverse of everything recorded restores the starting document
//! - Moves between containers, subtree removal and text edits mixed in one batch

use rand::prelude::*;
use scribe_engine::{
    inverse_batch, materialize, EngineConfig, Model, Node, Operation, Source, Surface, SurfaceId,
};
use std::time::Instant;

const SEEDS: u64 = 200;
const BATCHES: usize = 3;
const ATTRIBUTES: &[&str] = &["class", "id", "title"];
const VALUES: &[&str] = &["a", "b", "c"];
const CHARS: &[char] = &['a', 'b', 'x', ' ', 'é'];

fn document() -> Node {
    Node::element("div").with_children(vec![
        Node::element("p").with_child(Node::text("hello")),
        Node::element("p")
            .with_attr("class", "a")
            .with_children(vec![
                Node::text("one "),
                Node::element("b").with_child(Node::text("two")),
            ]),
        Node::element("ul").with_children(vec![
            Node::element("li").with_child(Node::text("x")),
            Node::element("li").with_child(Node::text("y")),
        ]),
    ])
}

fn rebuilt(surface: &Surface) -> Option<Node> {
    let mut model = Model::new(EngineConfig::default());
    model.reset(surface);
    model.root()
}

/// Connected nodes in document order, root first.
fn connected(surface: &Surface) -> Vec<SurfaceId> {
    let mut out = Vec::new();
    let mut stack = vec![surface.root()];
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(surface.children(node).iter().rev());
    }
    out
}

fn random_text(rng: &mut SmallRng) -> String {
    (0..rng.gen_range(1..4))
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())])
        .collect()
}

fn random_reference(rng: &mut SmallRng, surface: &Surface, parent: SurfaceId) -> Option<SurfaceId> {
    let children = surface.children(parent);
    let index = rng.gen_range(0..=children.len());
    children.get(index).copied()
}

fn random_edit(rng: &mut SmallRng, surface: &mut Surface) {
    let nodes = connected(surface);
    let elements: Vec<SurfaceId> = nodes.iter().copied().filter(|n| surface.is_element(*n)).collect();
    let texts: Vec<SurfaceId> = nodes.iter().copied().filter(|n| surface.is_text(*n)).collect();
    let non_root: Vec<SurfaceId> = nodes[1..].to_vec();

    match rng.gen_range(0..7) {
        0 if !texts.is_empty() => {
            let text = texts[rng.gen_range(0..texts.len())];
            let len = surface.text(text).map_or(0, |t| t.chars().count());
            let offset = rng.gen_range(0..=len);
            surface.insert_data(text, offset, &random_text(rng)).unwrap();
        }
        1 if !texts.is_empty() => {
            let text = texts[rng.gen_range(0..texts.len())];
            let len = surface.text(text).map_or(0, |t| t.chars().count());
            if len > 0 {
                let offset = rng.gen_range(0..len);
                let count = rng.gen_range(1..=len - offset);
                surface.delete_data(text, offset, count).unwrap();
            }
        }
        2 => {
            let element = elements[rng.gen_range(0..elements.len())];
            let name = ATTRIBUTES[rng.gen_range(0..ATTRIBUTES.len())];
            if rng.gen_bool(0.3) {
                surface.remove_attribute(element, name).unwrap();
            } else {
                surface
                    .set_attribute(element, name, VALUES[rng.gen_range(0..VALUES.len())])
                    .unwrap();
            }
        }
        3 => {
            let parent = elements[rng.gen_range(0..elements.len())];
            let fresh = if rng.gen_bool(0.5) {
                let p = surface.create_element("p");
                let text = surface.create_text(random_text(rng));
                surface.append_child(p, text).unwrap();
                p
            } else {
                surface.create_text(random_text(rng))
            };
            let reference = random_reference(rng, surface, parent);
            surface.insert_before(parent, fresh, reference).unwrap();
        }
        4 if non_root.len() > 1 => {
            let node = non_root[rng.gen_range(0..non_root.len())];
            surface.remove(node).unwrap();
        }
        5 if !non_root.is_empty() => {
            // Move a node into a container outside its own subtree
            let node = non_root[rng.gen_range(0..non_root.len())];
            let targets: Vec<SurfaceId> = elements
                .iter()
                .copied()
                .filter(|e| !surface.contains(node, *e))
                .collect();
            if let Some(target) = targets.choose(rng).copied() {
                let reference = random_reference(rng, surface, target).filter(|r| *r != node);
                surface.insert_before(target, node, reference).unwrap();
            }
        }
        _ if !texts.is_empty() => {
            let text = texts[rng.gen_range(0..texts.len())];
            surface.set_text(text, random_text(rng)).unwrap();
        }
        _ => {}
    }
}

#[test]
fn test_random_edits_round_trip() {
    for seed in 0..SEEDS {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut surface = materialize(&document()).unwrap();
        let mut model = Model::new(EngineConfig::default());
        model.attach(&mut surface);

        let start = model.root().unwrap();
        let mut all: Vec<Operation> = Vec::new();

        for batch in 0..BATCHES {
            let before = model.root().unwrap();
            for _ in 0..rng.gen_range(1..6) {
                random_edit(&mut rng, &mut surface);
            }
            let ops = model.flush(&mut surface, Instant::now());

            assert_eq!(model.root(), rebuilt(&surface), "seed {} batch {}", seed, batch);

            let mut replay = before;
            for op in &ops {
                op.apply_to(&mut replay).unwrap();
            }
            assert_eq!(Some(replay), model.root(), "seed {} batch {}", seed, batch);
            all.extend(ops);
        }

        let report = model
            .apply(&mut surface, &inverse_batch(&all), Source::Local)
            .unwrap();
        assert!(report.is_complete(), "seed {}: {:?}", seed, report.skipped);
        assert_eq!(model.root(), Some(start.clone()), "seed {}", seed);
        assert_eq!(rebuilt(&surface), Some(start), "seed {}", seed);
        assert!(model.flush(&mut surface, Instant::now()).is_empty(), "seed {}", seed);
    }
}
