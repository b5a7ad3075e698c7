//! Integration tests: pointer gestures driven through the `Editor` facade.

use fof_core::model::{PaymentRail, Port, Position};
use fof_core::{EdgeId, NodeId};
use fof_editor::input::{InputEvent, Modifiers, PointerButton};
use fof_editor::{ConnectionState, Editor, ToolKind};
use pretty_assertions::assert_eq;

const FIXTURE: &str = include_str!("fixtures/card_flow.json");

fn editor() -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut ed = Editor::default();
    ed.import_json(FIXTURE, 0.0).unwrap();
    ed
}

fn click(ed: &mut Editor, x: f32, y: f32, modifiers: Modifiers, t: f64) {
    ed.handle(
        &InputEvent::from_pointer_down(x, y, PointerButton::Primary, modifiers),
        t,
    );
    ed.handle(&InputEvent::from_pointer_up(x, y, modifiers), t);
}

fn down(ed: &mut Editor, x: f32, y: f32, t: f64) {
    ed.handle(
        &InputEvent::from_pointer_down(x, y, PointerButton::Primary, Modifiers::NONE),
        t,
    );
}

fn mv(ed: &mut Editor, x: f32, y: f32, t: f64) {
    ed.handle(&InputEvent::from_pointer_move(x, y, Modifiers::NONE), t);
}

fn up(ed: &mut Editor, x: f32, y: f32, t: f64) {
    ed.handle(&InputEvent::from_pointer_up(x, y, Modifiers::NONE), t);
}

fn position(ed: &Editor, id: &str) -> Position {
    ed.diagram().node(NodeId::intern(id)).unwrap().position
}

// ─── Drag ────────────────────────────────────────────────────────────────

#[test]
fn group_drag_snaps_primary_and_moves_rigidly() {
    let mut ed = editor();
    let merchant = NodeId::intern("merchant");
    let acquirer = NodeId::intern("acquirer");

    click(&mut ed, 90.0, 30.0, Modifiers::NONE, 10.0);
    click(&mut ed, 490.0, 30.0, Modifiers::SHIFT, 20.0);
    assert_eq!(ed.selection().node_ids(), vec![merchant, acquirer]);

    let depth = ed.document().history().undo_depth();
    down(&mut ed, 90.0, 30.0, 1000.0);
    mv(&mut ed, 100.0, 40.0, 1010.0);
    mv(&mut ed, 113.0, 47.0, 1016.0);
    assert!(ed.animation_frame(1017.0));

    // Primary target (23, 17) snaps to (40, 0); the same delta moves both.
    assert_eq!(position(&ed, "merchant"), Position::new(40.0, 0.0));
    assert_eq!(position(&ed, "acquirer"), Position::new(440.0, 0.0));
    assert_eq!(ed.engine().snap_guide().map(|g| (g.x, g.y)), Some((40.0, 0.0)));

    mv(&mut ed, 150.0, 47.0, 1030.0);
    up(&mut ed, 150.0, 47.0, 1032.0);
    assert_eq!(position(&ed, "merchant"), Position::new(80.0, 0.0));
    assert_eq!(position(&ed, "acquirer"), Position::new(480.0, 0.0));
    assert_eq!(ed.engine().snap_guide(), None);

    // One snapshot for the whole gesture; the selection survives the drag.
    assert_eq!(ed.document().history().undo_depth(), depth + 1);
    assert_eq!(ed.selection().node_ids(), vec![merchant, acquirer]);

    ed.undo();
    assert_eq!(position(&ed, "merchant"), Position::ZERO);
    assert_eq!(position(&ed, "acquirer"), Position::new(400.0, 0.0));
}

#[test]
fn drag_assigns_swimlanes_from_y() {
    let mut ed = editor();
    down(&mut ed, 90.0, 30.0, 0.0);
    mv(&mut ed, 90.0, 450.0, 5.0);
    up(&mut ed, 90.0, 450.0, 10.0);
    let node = ed.diagram().node(NodeId::intern("merchant")).unwrap();
    assert_eq!(node.position, Position::new(0.0, 440.0));
    assert_eq!(node.swimlane_id, Some(3));
}

#[test]
fn hairline_lane_height_is_clamped_before_nudging() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut ed = Editor::default();
    let report = ed
        .import_json(
            r#"{
                "version": 2,
                "diagram": { "nodes": [
                    { "id": "thin_lane_bank", "type": "bank", "label": "Bank", "shape": "rectangle", "position": { "x": 0, "y": 100 } }
                ] },
                "layout": { "swimlanes": { "grouping": "manual", "laneHeight": 1e-30 } }
            }"#,
            0.0,
        )
        .unwrap();
    assert_eq!(report.fallbacks, 1);

    ed.handle(&InputEvent::key_down("a", Modifiers { ctrl: true, ..Modifiers::NONE }), 10.0);
    ed.handle(&InputEvent::key_down("ArrowDown", Modifiers::NONE), 20.0);
    let node = ed.diagram().node(NodeId::intern("thin_lane_bank")).unwrap();
    assert_eq!(node.position, Position::new(0.0, 101.0));
    // 20-unit lanes: y = 101 sits in lane 6.
    assert_eq!(node.swimlane_id, Some(6));
}

#[test]
fn toolbar_layout_with_zero_lane_height_uses_the_default() {
    let mut ed = editor();
    let mut layout = ed.session().layout();
    layout.swimlanes.lane_height = 0.0;
    ed.set_layout(layout);
    assert_eq!(ed.session().lanes.lane_height, 200.0);

    down(&mut ed, 90.0, 30.0, 0.0);
    mv(&mut ed, 90.0, 450.0, 5.0);
    up(&mut ed, 90.0, 450.0, 10.0);
    assert_eq!(
        ed.diagram().node(NodeId::intern("merchant")).unwrap().swimlane_id,
        Some(3)
    );
}

#[test]
fn click_inside_multi_selection_collapses_on_release() {
    let mut ed = editor();
    ed.handle(&InputEvent::key_down("a", Modifiers { meta: true, ..Modifiers::NONE }), 0.0);
    assert_eq!(ed.selection().node_count(), 4);
    click(&mut ed, 490.0, 30.0, Modifiers::NONE, 10.0);
    assert_eq!(ed.selection().node_ids(), vec![NodeId::intern("acquirer")]);
}

// ─── Marquee ─────────────────────────────────────────────────────────────

#[test]
fn marquee_selects_inside_and_partial_but_not_outside() {
    let mut ed = editor();
    down(&mut ed, -50.0, -50.0, 0.0);
    mv(&mut ed, 200.0, 100.0, 5.0);
    assert_eq!(ed.selection().node_ids(), vec![NodeId::intern("merchant")]);

    // Now clips the acquirer's left edge; network and issuer stay out.
    mv(&mut ed, 420.0, 100.0, 10.0);
    assert_eq!(
        ed.selection().node_ids(),
        vec![NodeId::intern("merchant"), NodeId::intern("acquirer")]
    );
    up(&mut ed, 420.0, 100.0, 15.0);
    assert_eq!(ed.engine().marquee_rect(), None);
    assert_eq!(ed.selection().node_count(), 2);
}

#[test]
fn plain_background_click_clears_selection() {
    let mut ed = editor();
    click(&mut ed, 90.0, 30.0, Modifiers::NONE, 0.0);
    click(&mut ed, 300.0, 250.0, Modifiers::NONE, 10.0);
    assert!(ed.selection().is_empty());
}

// ─── Connections ─────────────────────────────────────────────────────────

#[test]
fn reconnect_preserves_id_source_and_attributes() {
    let mut ed = editor();
    let clearing = EdgeId::intern("clearing");

    // Midpoint of the acquirer → network curve.
    click(&mut ed, 485.0, 230.0, Modifiers::NONE, 0.0);
    assert_eq!(ed.selection().edge(), Some(clearing));

    // Drag its target handle (network top port) onto the issuer.
    down(&mut ed, 480.0, 400.0, 10.0);
    assert_eq!(ed.engine().reconnecting(), Some(clearing));
    mv(&mut ed, 850.0, 420.0, 20.0);
    up(&mut ed, 890.0, 405.0, 30.0);

    let edge = ed.diagram().edge(clearing).unwrap();
    assert_eq!(edge.source_id, NodeId::intern("acquirer"));
    assert_eq!(edge.source_port, Port::Bottom);
    assert_eq!(edge.target_id, NodeId::intern("issuer"));
    assert_eq!(edge.target_port, Port::Top);
    assert_eq!(edge.rail, PaymentRail::Card);
    assert_eq!(edge.sequence, Some(2));
    assert_eq!(ed.diagram().edges.len(), 3);
    assert_eq!(ed.selection().edge(), Some(clearing));
}

#[test]
fn reconnect_dropped_on_empty_canvas_changes_nothing() {
    let mut ed = editor();
    let before = ed.diagram().clone();
    click(&mut ed, 485.0, 230.0, Modifiers::NONE, 0.0);
    down(&mut ed, 480.0, 400.0, 10.0);
    mv(&mut ed, 700.0, 200.0, 20.0);
    up(&mut ed, 700.0, 200.0, 30.0);
    assert_eq!(ed.diagram(), &before);
    assert_eq!(ed.engine().connection(), ConnectionState::Idle);
}

#[test]
fn connect_tool_creates_blank_rail_edge_and_escape_cancels() {
    let mut ed = editor();
    ed.set_tool(ToolKind::Connect, 0.0);

    click(&mut ed, 480.0, 440.0, Modifiers::NONE, 10.0);
    assert!(matches!(ed.engine().connection(), ConnectionState::Pending { .. }));
    ed.handle(&InputEvent::key_down("Escape", Modifiers::NONE), 20.0);
    assert_eq!(ed.engine().connection(), ConnectionState::Idle);

    click(&mut ed, 480.0, 440.0, Modifiers::NONE, 30.0);
    click(&mut ed, 860.0, 470.0, Modifiers::NONE, 40.0);
    assert_eq!(ed.diagram().edges.len(), 4);
    let created = ed.selection().edge().unwrap();
    let edge = ed.diagram().edge(created).unwrap();
    assert_eq!(edge.source_id, NodeId::intern("network"));
    assert_eq!(edge.target_id, NodeId::intern("issuer"));
    assert_eq!(edge.rail, PaymentRail::Blank);
    assert_eq!(edge.target_port, Port::Bottom);
}

#[test]
fn deleting_a_free_connector_prunes_its_handles() {
    let mut ed = editor();
    ed.set_tool(ToolKind::Connector, 0.0);
    down(&mut ed, 100.0, 700.0, 10.0);
    mv(&mut ed, 200.0, 700.0, 20.0);
    up(&mut ed, 300.0, 700.0, 30.0);
    assert_eq!(ed.diagram().nodes.len(), 6);
    assert_eq!(ed.session().tool, ToolKind::Select);

    assert!(ed.delete_selection(40.0));
    assert_eq!(ed.diagram().nodes.len(), 4);
    assert_eq!(ed.diagram().edges.len(), 3);
}

// ─── Viewport ────────────────────────────────────────────────────────────

#[test]
fn ctrl_wheel_zoom_keeps_pointer_anchored() {
    let mut ed = editor();
    let pointer = (250.0, 180.0);
    let before = ed.viewport().to_world(pointer.0, pointer.1);
    let wheel = InputEvent::Wheel {
        x: pointer.0,
        y: pointer.1,
        dx: 0.0,
        dy: -40.0,
        modifiers: Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        },
    };
    for t in 0..5 {
        ed.handle(&wheel, f64::from(t));
    }
    let after = ed.viewport().to_world(pointer.0, pointer.1);
    assert!(ed.viewport().zoom() > 1.4);
    assert!((before.x - after.x).abs() < 1e-3 && (before.y - after.y).abs() < 1e-3);
}

#[test]
fn space_drag_pans_instead_of_selecting() {
    let mut ed = editor();
    ed.handle(&InputEvent::key_down(" ", Modifiers::NONE), 0.0);
    down(&mut ed, 90.0, 30.0, 1.0);
    mv(&mut ed, 140.0, 60.0, 2.0);
    up(&mut ed, 140.0, 60.0, 3.0);
    ed.handle(&InputEvent::KeyUp { key: " ".into() }, 4.0);

    let t = ed.viewport().transform();
    assert_eq!((t.x, t.y), (50.0, 30.0));
    assert!(ed.selection().is_empty());
    assert_eq!(position(&ed, "merchant"), Position::ZERO);
}

#[test]
fn pen_stroke_is_undoable() {
    let mut ed = editor();
    ed.set_tool(ToolKind::Pen, 0.0);
    down(&mut ed, 10.0, 600.0, 1.0);
    mv(&mut ed, 40.0, 620.0, 2.0);
    up(&mut ed, 80.0, 610.0, 3.0);
    assert_eq!(ed.diagram().drawings.len(), 1);
    ed.undo();
    assert!(ed.diagram().drawings.is_empty());
}

#[test]
fn edge_end_handles_only_exist_for_the_selected_edge() {
    let mut ed = editor();
    // Nothing selected: the network's top port takes the press instead.
    down(&mut ed, 480.0, 400.0, 0.0);
    assert_eq!(ed.engine().reconnecting(), None);
    mv(&mut ed, 600.0, 300.0, 1.0);
    assert!(matches!(
        ed.engine().connection(),
        ConnectionState::DirectDrag { .. }
    ));
    up(&mut ed, 600.0, 300.0, 2.0);
    assert_eq!(ed.engine().connection(), ConnectionState::Idle);
    assert_eq!(ed.diagram().edges.len(), 3);
}
