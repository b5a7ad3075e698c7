//! Integration tests: history behaviour across editor commands.

use fof_core::model::{Diagram, Edge, EntityKind, Node, Port, Position};
use fof_core::viewport::ContainerRect;
use fof_core::{EdgeId, NodeId};
use fof_editor::input::{InputEvent, Modifiers, PointerButton};
use fof_editor::{EdgeField, Editor, HistoryConfig, NodeField};
use fof_render::route::{RouteConfig, route_all};
use pretty_assertions::assert_eq;

const FIXTURE: &str = include_str!("fixtures/card_flow.json");

fn editor() -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut ed = Editor::default();
    ed.import_json(FIXTURE, 0.0).unwrap();
    ed
}

// ─── Round trip ──────────────────────────────────────────────────────────

#[test]
fn every_command_undoes_and_redoes_in_order() {
    let mut ed = editor();
    let imported = ed.diagram().clone();
    let mut states: Vec<Diagram> = vec![imported.clone()];

    ed.drop_entity(EntityKind::Wallet, 200.0, 300.0, 1_000.0).unwrap();
    states.push(ed.diagram().clone());

    ed.set_node_field(NodeId::intern("issuer"), NodeField::Label("Issuing Bank".into()), 2_000.0)
        .unwrap();
    states.push(ed.diagram().clone());

    ed.set_edge_field(EdgeId::intern("capture"), EdgeField::Amount(Some(125.5)), 3_000.0)
        .unwrap();
    states.push(ed.diagram().clone());

    // Acquirer touches every edge in the fixture.
    ed.handle(
        &InputEvent::from_pointer_down(490.0, 30.0, PointerButton::Primary, Modifiers::NONE),
        4_000.0,
    );
    ed.handle(&InputEvent::from_pointer_up(490.0, 30.0, Modifiers::NONE), 4_000.0);
    ed.handle(&InputEvent::key_down("Delete", Modifiers::NONE), 4_010.0);
    assert!(ed.diagram().edges.is_empty());
    assert_eq!(ed.diagram().nodes.len(), 4);
    states.push(ed.diagram().clone());

    for expected in states.iter().rev().skip(1) {
        assert!(ed.undo());
        assert_eq!(ed.diagram(), expected);
    }
    // The import itself is the oldest entry.
    assert!(ed.undo());
    assert!(ed.diagram().is_empty());
    assert!(!ed.can_undo());

    assert!(ed.redo());
    assert_eq!(ed.diagram(), &imported);
    for expected in states.iter().skip(1) {
        assert!(ed.redo());
        assert_eq!(ed.diagram(), expected);
    }
    assert!(!ed.can_redo());
}

#[test]
fn new_edit_after_undo_discards_redo() {
    let mut ed = editor();
    ed.drop_entity(EntityKind::Ledger, 100.0, 500.0, 1_000.0).unwrap();
    ed.undo();
    assert!(ed.can_redo());

    ed.set_node_field(NodeId::intern("merchant"), NodeField::Color(Some("#22c55e".into())), 2_000.0)
        .unwrap();
    assert!(!ed.can_redo());
    assert_eq!(ed.diagram().nodes.len(), 4);
}

#[test]
fn failed_edit_leaves_history_untouched() {
    let mut ed = editor();
    let depth = ed.document().history().undo_depth();
    assert!(
        ed.set_edge_field(EdgeId::intern("missing"), EdgeField::Label("x".into()), 10.0)
            .is_err()
    );
    assert_eq!(ed.document().history().undo_depth(), depth);
}

#[test]
fn unchanged_edit_records_nothing() {
    let mut ed = editor();
    let depth = ed.document().history().undo_depth();
    let changed = ed
        .set_node_field(NodeId::intern("merchant"), NodeField::Label("Merchant".into()), 10.0)
        .unwrap();
    assert!(!changed);
    assert_eq!(ed.document().history().undo_depth(), depth);
}

// ─── Merging ─────────────────────────────────────────────────────────────

#[test]
fn typing_bursts_split_after_the_field_window() {
    let mut ed = editor();
    let issuer = NodeId::intern("issuer");
    let depth = ed.document().history().undo_depth();
    for (t, label) in [(1_000.0, "I"), (1_400.0, "Is"), (1_800.0, "Iss")] {
        ed.set_node_field(issuer, NodeField::Label(label.into()), t).unwrap();
    }
    assert_eq!(ed.document().history().undo_depth(), depth + 1);

    // A pause longer than the window starts a new step.
    ed.set_node_field(issuer, NodeField::Label("Issu".into()), 3_000.0).unwrap();
    assert_eq!(ed.document().history().undo_depth(), depth + 2);

    ed.undo();
    assert_eq!(ed.diagram().node(issuer).unwrap().label, "Iss");
    ed.undo();
    assert_eq!(ed.diagram().node(issuer).unwrap().label, "Issuer");
}

#[test]
fn history_is_capped() {
    let config = HistoryConfig {
        limit: 3,
        ..HistoryConfig::default()
    };
    let mut ed = Editor::with_config(Diagram::new(), config, ContainerRect::default());
    for i in 0..5 {
        ed.drop_entity(EntityKind::Bank, 100.0 + 200.0 * i as f32, 100.0, f64::from(i) * 1_000.0)
            .unwrap();
    }
    let mut undone = 0;
    while ed.undo() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(ed.diagram().nodes.len(), 2);
}

#[test]
fn undo_mid_drag_drops_the_gesture() {
    let mut ed = editor();
    ed.handle(
        &InputEvent::from_pointer_down(90.0, 30.0, PointerButton::Primary, Modifiers::NONE),
        1_000.0,
    );
    ed.handle(&InputEvent::from_pointer_move(200.0, 30.0, Modifiers::NONE), 1_010.0);
    ed.animation_frame(1_016.0);
    assert!(ed.engine().is_dragging());

    ed.undo();
    assert!(!ed.engine().is_dragging());
    ed.handle(&InputEvent::from_pointer_move(300.0, 30.0, Modifiers::NONE), 1_030.0);
    ed.handle(&InputEvent::from_pointer_up(300.0, 30.0, Modifiers::NONE), 1_040.0);
    assert!(!ed.animation_frame(1_050.0));
    assert_eq!(
        ed.diagram().node(NodeId::intern("merchant")).unwrap().position.x,
        0.0
    );
}

// ─── Export / routing ────────────────────────────────────────────────────

#[test]
fn export_reimports_to_the_same_diagram() {
    let ed = editor();
    let json = ed.export_json().unwrap();
    let mut other = Editor::default();
    other.import_json(&json, 0.0).unwrap();
    assert_eq!(other.diagram(), ed.diagram());
    assert_eq!(other.session().layout(), ed.session().layout());
}

#[test]
fn opposite_edges_between_a_pair_fan_apart() {
    let ed = editor();
    let routes = route_all(ed.diagram(), &RouteConfig::default());
    let offset = |id: &str| {
        routes
            .iter()
            .find(|r| r.edge == EdgeId::intern(id))
            .map(|r| r.offset)
            .unwrap()
    };
    assert_eq!(offset("capture"), -14.0);
    assert_eq!(offset("refund"), 14.0);
    assert_eq!(offset("clearing"), 0.0);

    let start = |id: &str| routes.iter().find(|r| r.edge == EdgeId::intern(id)).unwrap().start;
    assert!((start("capture").y - start("refund").y).abs() > 10.0);
}

#[test]
fn two_edges_in_the_same_direction_fan_symmetrically() {
    let a = NodeId::intern("fan_payer");
    let b = NodeId::intern("fan_payee");
    let mut d = Diagram::new();
    d.add_node(Node::new(a, EntityKind::Customer, "Payer", Position::new(0.0, 0.0)))
        .unwrap();
    d.add_node(Node::new(b, EntityKind::Merchant, "Payee", Position::new(400.0, 0.0)))
        .unwrap();
    for id in ["fan_debit", "fan_fee"] {
        d.add_edge(Edge::new(EdgeId::intern(id), a, Port::Right, b, Port::Left))
            .unwrap();
    }

    let config = RouteConfig::default();
    let routes = route_all(&d, &config);
    let offsets: Vec<f32> = routes.iter().map(|r| r.offset).collect();
    let half = config.fan_gap / 2.0;
    assert_eq!(offsets, vec![-half, half]);
    assert!(offsets.iter().all(|o| *o != 0.0));
    assert!((routes[0].start.y - routes[1].start.y).abs() > 10.0);
}
