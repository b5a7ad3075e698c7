//! Integration tests: diagram → envelope → diagram, and legacy import.

use fof_core::interchange::{FORMAT_VERSION, export_json, import_json};
use fof_core::layout::{LaneGrouping, LayoutSettings, Swimlane};
use fof_core::{EdgeId, LineStyle, NodeId, NodeShape, PathType, PaymentRail, starter_diagram};
use pretty_assertions::assert_eq;

// ─── Round trip ──────────────────────────────────────────────────────────

#[test]
fn starter_diagram_round_trips() {
    let diagram = starter_diagram();
    let layout = LayoutSettings::default();

    let json = export_json(&diagram, &layout).unwrap();
    let imported = import_json(&json).unwrap();

    assert_eq!(imported.version, FORMAT_VERSION);
    assert_eq!(imported.diagram, diagram);
    assert!(imported.report.is_clean());
}

#[test]
fn layout_block_round_trips() {
    let mut layout = LayoutSettings::default();
    layout.swimlanes.grouping = LaneGrouping::Manual;
    layout.swimlanes.lane_height = 160.0;
    layout.swimlanes.lanes = vec![
        Swimlane {
            id: 1,
            label: "Consumer".into(),
        },
        Swimlane {
            id: 2,
            label: "Bank".into(),
        },
    ];
    layout.grid.snap = false;

    let json = export_json(&starter_diagram(), &layout).unwrap();
    assert_eq!(import_json(&json).unwrap().layout, layout);
}

#[test]
fn envelope_shape_is_stable() {
    let json = export_json(&starter_diagram(), &LayoutSettings::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["version"], 2);
    assert_eq!(value["diagram"]["nodes"][0]["type"], "customer");
    assert_eq!(value["diagram"]["edges"][0]["sourcePortIdx"], 1);
    assert_eq!(value["diagram"]["edges"][0]["targetPortIdx"], 3);
    assert_eq!(value["diagram"]["edges"][0]["rail"], "card");
    assert_eq!(value["layout"]["grid"]["size"], 40.0);
}

// ─── Legacy files ────────────────────────────────────────────────────────

#[test]
fn legacy_fixture_is_sanitized() {
    let imported = import_json(include_str!("fixtures/legacy_v1.json")).unwrap();
    let d = &imported.diagram;

    assert_eq!(imported.version, 1);
    // `stray` handle has no edges and is pruned; `broken` edge dangles.
    assert_eq!(d.nodes.len(), 5);
    assert_eq!(d.edges.len(), 3);
    assert!(!d.contains_node(NodeId::intern("stray")));
    assert!(d.edge(EdgeId::intern("broken")).is_none());
    assert_eq!(imported.report.dropped_edges, 1);
    assert_eq!(imported.report.pruned_handles, 1);

    let cardholder = d.node(NodeId::intern("cardholder")).unwrap();
    assert_eq!(cardholder.shape, NodeShape::RoundedRect);

    let auth = d.edge(EdgeId::intern("auth")).unwrap();
    assert_eq!(auth.rail, PaymentRail::Card);
    assert_eq!(auth.amount, Some(42.5));

    let funding = d.edge(EdgeId::intern("funding")).unwrap();
    assert_eq!(funding.path_type, PathType::Orthogonal);
    assert!(funding.is_fx);

    let note = d.edge(EdgeId::intern("note")).unwrap();
    assert_eq!(note.style, LineStyle::Dashed);
}

#[test]
fn failed_import_leaves_caller_state_alone() {
    let mut current = starter_diagram();
    let before = current.clone();
    if let Ok(imported) = import_json(r#"{"version": 2}"#) {
        current = imported.diagram;
    }
    assert_eq!(current, before);
}
