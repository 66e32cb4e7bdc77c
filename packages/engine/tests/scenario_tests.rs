//! End-to-end scenarios: surface edits in, operations out
//!
//! This tests:
//! - Insertion of new subtrees
//! - Attribute changes
//! - Removal of the last child
//! - Cancelling batches and history collapse
//! - Coalescing of nested records
//! - Text diff minimality

use scribe_engine::{
    CapturedRecord, EngineConfig, History, Model, MutationRecord, Node, Operation, Properties,
    Source, Surface, SurfaceId,
};
use std::time::Instant;

fn attach(surface: &mut Surface) -> Model {
    let mut model = Model::new(EngineConfig::default());
    model.attach(surface);
    model
}

fn paragraph(surface: &mut Surface, text: &str) -> SurfaceId {
    let p = surface.create_element("p");
    let text = surface.create_text(text);
    surface.append_child(p, text).unwrap();
    p
}

#[test]
fn test_insert_paragraph_with_two_texts() {
    let mut surface = Surface::new("div");
    let first = paragraph(&mut surface, "first");
    surface.append_child(surface.root(), first).unwrap();
    let mut model = attach(&mut surface);

    let p = surface.create_element("p");
    let a = surface.create_text("a");
    let b = surface.create_text("b");
    surface.append_child(p, a).unwrap();
    surface.append_child(p, b).unwrap();
    surface.append_child(surface.root(), p).unwrap();

    let ops = model.flush(&mut surface, Instant::now());
    assert_eq!(
        ops,
        vec![Operation::insert_node(
            vec![1],
            Node::element("p").with_children(vec![Node::text("a"), Node::text("b")])
        )]
    );
    assert_eq!(model.path_of(b), Some(vec![1, 1]));
}

#[test]
fn test_change_one_attribute() {
    let mut surface = Surface::new("div");
    let p = paragraph(&mut surface, "x");
    surface.set_attribute(p, "class", "a").unwrap();
    surface.append_child(surface.root(), p).unwrap();
    let mut model = attach(&mut surface);

    surface.set_attribute(p, "class", "b").unwrap();
    let ops = model.flush(&mut surface, Instant::now());

    assert_eq!(
        ops,
        vec![Operation::set_node(
            vec![0],
            Properties::from([("class".to_string(), Some("a".to_string()))]),
            Properties::from([("class".to_string(), Some("b".to_string()))]),
        )]
    );
}

#[test]
fn test_remove_last_remaining_child() {
    let mut surface = Surface::new("div");
    let p = paragraph(&mut surface, "only");
    surface.append_child(surface.root(), p).unwrap();
    let mut model = attach(&mut surface);
    let before = model.root().unwrap();

    surface.remove(p).unwrap();
    let ops = model.flush(&mut surface, Instant::now());

    assert_eq!(
        ops,
        vec![Operation::remove_node(
            vec![0],
            Node::element("p").with_child(Node::text("only"))
        )]
    );
    assert_eq!(model.find_node(&[0]), None);

    // Replaying on a second copy lands in the same place
    let mut replica = scribe_engine::materialize(&before).unwrap();
    let mut replica_model = attach(&mut replica);
    let report = replica_model.apply(&mut replica, &ops, Source::Remote).unwrap();
    assert!(report.is_complete());
    assert_eq!(replica_model.find_node(&[0]), None);
    assert_eq!(replica.to_html(), "<div></div>");
}

#[test]
fn test_inverse_batches_cancel_in_history() {
    let mut surface = Surface::new("div");
    let first = paragraph(&mut surface, "first");
    surface.append_child(surface.root(), first).unwrap();
    let mut model = attach(&mut surface);
    let mut history = History::new();

    let p = paragraph(&mut surface, "second");
    surface.append_child(surface.root(), p).unwrap();
    let inserted = model.flush(&mut surface, Instant::now());
    history.record(&inserted);
    assert_eq!(history.undo_levels(), 1);

    surface.remove(p).unwrap();
    let removed = model.flush(&mut surface, Instant::now());
    history.record(&removed);

    assert_eq!(inserted.len(), 1);
    assert_eq!(removed.len(), 1);
    assert!(inserted[0].is_reverse(&removed[0]));
    assert_eq!(history.undo_levels(), 0);
}

#[test]
fn test_nested_records_match_single_outer_record() {
    fn setup() -> (Surface, Model, SurfaceId, SurfaceId) {
        let mut surface = Surface::new("div");
        let p0 = paragraph(&mut surface, "alpha");
        let p1 = paragraph(&mut surface, "beta");
        surface.append_child(surface.root(), p0).unwrap();
        surface.append_child(surface.root(), p1).unwrap();
        let model = attach(&mut surface);
        (surface, model, p0, p1)
    }

    fn edit(surface: &mut Surface, p0: SurfaceId, p1: SurfaceId) {
        let text = surface.children(p0)[0];
        surface.set_text(text, "ALPHA").unwrap();
        surface.set_attribute(p1, "id", "b").unwrap();
        let extra = surface.create_element("br");
        surface.append_child(p0, extra).unwrap();
    }

    let (mut surface, mut model, p0, p1) = setup();
    edit(&mut surface, p0, p1);
    let nested = model.flush(&mut surface, Instant::now());

    let (mut other, mut other_model, q0, q1) = setup();
    edit(&mut other, q0, q1);
    other.take_records();
    let whole = MutationRecord::child_list(other.root(), Vec::new(), Vec::new(), None, None);
    let single = other_model.transform(
        &other,
        &[CapturedRecord {
            record: whole,
            text: None,
        }],
    );

    assert_eq!(nested, single);
    assert_eq!(nested.iter().filter(|op| op.name() == "set_node").count(), 1);
    assert_eq!(nested.iter().filter(|op| op.name() == "insert_node").count(), 1);
    assert_eq!(model.root(), other_model.root());
}

#[test]
fn test_one_char_change_in_long_text() {
    let original: String = (0..1000).map(|i| (b'a' + (i % 26) as u8) as char).collect();
    let mut surface = Surface::new("div");
    let p = paragraph(&mut surface, &original);
    surface.append_child(surface.root(), p).unwrap();
    let mut model = attach(&mut surface);

    let text = surface.children(p)[0];
    let mut edited: Vec<char> = original.chars().collect();
    let replaced = edited[500];
    edited[500] = '#';
    surface.set_text(text, edited.iter().collect::<String>()).unwrap();

    let ops = model.flush(&mut surface, Instant::now());
    assert_eq!(
        ops,
        vec![
            Operation::remove_text(vec![0, 0], 500, replaced.to_string()),
            Operation::insert_text(vec![0, 0], 500, "#"),
        ]
    );
}

#[test]
fn test_selection_markers_do_not_produce_operations() {
    let mut surface = Surface::new("div");
    let p = paragraph(&mut surface, "text");
    surface.append_child(surface.root(), p).unwrap();
    let mut model = attach(&mut surface);

    let cursor = surface.create_element("span");
    surface
        .set_attribute(cursor, scribe_engine::transient::SELECTION_MARKER, "cursor")
        .unwrap();
    surface.append_child(p, cursor).unwrap();
    surface.set_attribute(p, "data-card-loading", "local").unwrap();

    assert!(model.flush(&mut surface, Instant::now()).is_empty());
    assert_eq!(model.path_of(surface.children(p)[0]), Some(vec![0, 0]));
}

#[test]
fn test_root_attribute_change_reaches_replicas() {
    let mut surface = Surface::new("div");
    let p = paragraph(&mut surface, "body");
    surface.append_child(surface.root(), p).unwrap();
    let mut model = attach(&mut surface);
    let before = model.root().unwrap();

    surface.set_attribute(surface.root(), "class", "z").unwrap();
    let ops = model.flush(&mut surface, Instant::now());

    assert_eq!(
        ops,
        vec![Operation::set_node(
            Vec::new(),
            Properties::new(),
            Properties::from([("class".to_string(), Some("z".to_string()))]),
        )]
    );

    let mut rebuilt = Model::new(EngineConfig::default());
    rebuilt.reset(&surface);
    assert_eq!(model.root(), rebuilt.root());

    let mut replica = scribe_engine::materialize(&before).unwrap();
    let mut replica_model = attach(&mut replica);
    replica_model.apply(&mut replica, &ops, Source::Remote).unwrap();
    assert_eq!(replica.to_html(), "<div class=\"z\"><p>body</p></div>");
    assert_eq!(replica_model.root(), model.root());
}
