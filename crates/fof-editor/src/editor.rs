//! Editor facade: one document, one canvas engine, optional persistence.
//!
//! Every host-visible operation lands here and ends in
//! `Document::commit`, so history is always recorded before the diagram
//! changes.

use crate::document::{Document, Proposal};
use crate::engine::{CanvasEngine, EngineOutput};
use crate::history::{HistoryConfig, MergeKey, MergeWindows};
use crate::input::{InputEvent, Modifiers};
use crate::mutation::{EdgeField, GraphMutation, NodeField};
use crate::selection::Selection;
use crate::session::SessionState;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::ToolKind;
use crate::viewport::ViewportController;
use fof_core::error::{DiagramError, ImportError};
use fof_core::export::{EXPORT_PADDING, export_bounds};
use fof_core::geometry::default_size;
use fof_core::id::{EdgeId, NodeId};
use fof_core::interchange::{self, SanitizeReport};
use fof_core::layout::LayoutSettings;
use fof_core::model::{Bounds, Diagram, EntityKind, Node, Position};
use fof_core::starter::starter_diagram;
use fof_core::storage::SnapshotStore;
use fof_core::viewport::ContainerRect;

/// Outcome of `Editor::save`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    /// The store refused; in-memory state is intact.
    NotSaved,
    NoStore,
}

pub struct Editor {
    document: Document,
    engine: CanvasEngine,
    windows: MergeWindows,
    store: Option<Box<dyn SnapshotStore>>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Diagram::new())
    }
}

impl Editor {
    pub fn new(diagram: Diagram) -> Self {
        Self::with_config(diagram, HistoryConfig::default(), ContainerRect::default())
    }

    pub fn with_config(diagram: Diagram, history: HistoryConfig, rect: ContainerRect) -> Self {
        Self {
            document: Document::with_config(diagram, history),
            engine: CanvasEngine::new(SessionState::default(), rect).with_windows(history.windows),
            windows: history.windows,
            store: None,
        }
    }

    /// Fresh canvas with the starter diagram.
    pub fn starter() -> Self {
        Self::new(starter_diagram())
    }

    // ── Accessors ──

    pub fn diagram(&self) -> &Diagram {
        self.document.diagram()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn engine(&self) -> &CanvasEngine {
        &self.engine
    }

    pub fn selection(&self) -> &Selection {
        self.engine.selection()
    }

    pub fn session(&self) -> &SessionState {
        self.engine.session()
    }

    pub fn viewport(&self) -> &ViewportController {
        self.engine.viewport()
    }

    pub fn can_undo(&self) -> bool {
        self.document.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.document.history().can_redo()
    }

    // ── Commit plumbing ──

    fn commit(&mut self, proposal: Proposal, now_ms: f64) -> Result<bool, DiagramError> {
        let result = self.document.commit(proposal, now_ms);
        if let Err(err) = &result {
            log::warn!("mutation rejected: {err}");
        }
        self.engine.selection_mut().retain_existing(self.document.diagram());
        result
    }

    fn apply(&mut self, out: EngineOutput, now_ms: f64) -> bool {
        let mut redraw = out.redraw;
        for proposal in out.proposals {
            redraw |= self.commit(proposal, now_ms).unwrap_or(false);
        }
        redraw
    }

    // ── Input ──

    /// Feed one input event. Returns whether the canvas needs a redraw.
    pub fn handle(&mut self, event: &InputEvent, now_ms: f64) -> bool {
        match event {
            InputEvent::KeyDown { key, modifiers } => self.key_down(key, modifiers, now_ms),
            InputEvent::KeyUp { key } => {
                if key == " " {
                    self.engine.session_mut().space_held = false;
                }
                false
            }
            _ => {
                let out = self.engine.handle(self.document.diagram(), event);
                self.apply(out, now_ms)
            }
        }
    }

    /// Animation-frame tick: commit coalesced drag positions.
    pub fn animation_frame(&mut self, now_ms: f64) -> bool {
        match self.engine.flush_frame() {
            Some(proposal) => self.commit(proposal, now_ms).unwrap_or(false),
            None => false,
        }
    }

    fn key_down(&mut self, key: &str, modifiers: &Modifiers, now_ms: f64) -> bool {
        let Some(action) = ShortcutMap::resolve(key, modifiers) else {
            return false;
        };
        log::debug!("shortcut {action:?}");
        match action {
            ShortcutAction::Tool(tool) => self.set_tool(tool, now_ms),
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selection(now_ms),
            ShortcutAction::SelectAll => self.select_all(),
            ShortcutAction::Escape => {
                let out = self.engine.escape();
                self.apply(out, now_ms)
            }
            ShortcutAction::Nudge { dx, dy, coarse } => self.nudge(dx, dy, coarse, now_ms),
            ShortcutAction::ZoomIn => {
                self.engine.viewport_mut().zoom_in();
                true
            }
            ShortcutAction::ZoomOut => {
                self.engine.viewport_mut().zoom_out();
                true
            }
            ShortcutAction::ZoomReset => {
                self.engine.viewport_mut().reset_zoom();
                true
            }
            ShortcutAction::ZoomToFit => self.fit_to_content(),
            ShortcutAction::ToggleGrid => {
                let grid = &mut self.engine.session_mut().grid;
                grid.visible = !grid.visible;
                true
            }
            ShortcutAction::ToggleSnap => {
                let grid = &mut self.engine.session_mut().grid;
                grid.snap = !grid.snap;
                true
            }
            ShortcutAction::PanStart => {
                self.engine.session_mut().space_held = true;
                false
            }
        }
    }

    // ── Commands ──

    /// Switch tools. A drag still in flight is committed first.
    pub fn set_tool(&mut self, tool: ToolKind, now_ms: f64) -> bool {
        let out = self.engine.set_tool(tool);
        self.apply(out, now_ms)
    }

    pub fn undo(&mut self) -> bool {
        self.engine.cancel_gestures();
        let changed = self.document.undo();
        self.engine.selection_mut().retain_existing(self.document.diagram());
        changed
    }

    pub fn redo(&mut self) -> bool {
        self.engine.cancel_gestures();
        let changed = self.document.redo();
        self.engine.selection_mut().retain_existing(self.document.diagram());
        changed
    }

    /// Delete selected nodes (cascading to their edges) or the selected edge.
    pub fn delete_selection(&mut self, now_ms: f64) -> bool {
        let selection = self.engine.selection();
        let mutation = if selection.node_count() > 0 {
            GraphMutation::RemoveNodes {
                ids: selection.node_ids(),
            }
        } else if let Some(id) = selection.edge() {
            GraphMutation::RemoveEdge { id }
        } else {
            return false;
        };
        self.engine.cancel_gestures();
        let changed = self
            .commit(Proposal::push(vec![mutation]), now_ms)
            .unwrap_or(false);
        self.engine.selection_mut().clear();
        changed
    }

    /// Select every node except connector handles.
    pub fn select_all(&mut self) -> bool {
        let ids: Vec<NodeId> = self
            .document
            .diagram()
            .nodes
            .iter()
            .filter(|n| !n.is_connector_handle)
            .map(|n| n.id)
            .collect();
        self.engine.selection_mut().select_nodes(ids);
        true
    }

    /// Arrow-key move: one world unit, or one grid cell when `coarse`.
    pub fn nudge(&mut self, dx: i8, dy: i8, coarse: bool, now_ms: f64) -> bool {
        let ids = self.engine.selection().node_ids();
        if ids.is_empty() {
            return false;
        }
        let session = self.engine.session();
        let step = if coarse { session.grid.size } else { 1.0 };
        let moves: Vec<GraphMutation> = ids
            .iter()
            .filter_map(|id| self.document.diagram().node(*id))
            .map(|n| {
                let position = n.position.offset(f32::from(dx) * step, f32::from(dy) * step);
                GraphMutation::MoveNode {
                    id: n.id,
                    position,
                    swimlane: session.lanes.assign(position.y),
                }
            })
            .collect();
        let proposal = Proposal::merge(moves, MergeKey::nudge(ids), self.windows.nudge_ms);
        self.commit(proposal, now_ms).unwrap_or(false)
    }

    /// Drop a new entity from the palette, centred on the client point.
    pub fn drop_entity(&mut self, kind: EntityKind, client_x: f32, client_y: f32, now_ms: f64) -> Option<NodeId> {
        let world = self.engine.viewport().to_world(client_x, client_y);
        let session = self.engine.session();
        let mut node = Node::new(NodeId::with_prefix("node"), kind, kind.display_name(), Position::ZERO);
        let size = default_size(node.shape, false);
        let mut position = world.offset(-size.width / 2.0, -size.height / 2.0);
        if session.grid.snap {
            position = Position::new(
                session.grid.snap_value(position.x),
                session.grid.snap_value(position.y),
            );
        }
        node.position = position;
        node.z_index = self.document.diagram().next_z_index();
        node.swimlane_id = session.lanes.assign(position.y);

        let id = node.id;
        let proposal = Proposal::push(vec![GraphMutation::AddNode { node: Box::new(node) }]);
        match self.commit(proposal, now_ms) {
            Ok(_) => {
                self.engine.selection_mut().select_nodes([id]);
                Some(id)
            }
            Err(_) => None,
        }
    }

    /// Inspector edit of one node field.
    pub fn set_node_field(&mut self, id: NodeId, field: NodeField, now_ms: f64) -> Result<bool, DiagramError> {
        let key = MergeKey::NodeField(id, field.name());
        let proposal = Proposal::merge(
            vec![GraphMutation::SetNodeField { id, field }],
            key,
            self.windows.field_ms,
        );
        self.commit(proposal, now_ms)
    }

    /// Inspector edit of one edge field. Presentation fields also become
    /// the defaults for the next edge drawn.
    pub fn set_edge_field(&mut self, id: EdgeId, field: EdgeField, now_ms: f64) -> Result<bool, DiagramError> {
        let key = MergeKey::EdgeField(id, field.name());
        let sticky = field.is_sticky().then(|| field.clone());
        let proposal = Proposal::merge(
            vec![GraphMutation::SetEdgeField { id, field }],
            key,
            self.windows.field_ms,
        );
        let result = self.commit(proposal, now_ms);
        if result.is_ok()
            && let Some(field) = sticky
        {
            self.engine.session_mut().edge_defaults.remember(&field);
        }
        result
    }

    // ── Viewport ──

    pub fn resize(&mut self, rect: ContainerRect) {
        self.engine.viewport_mut().set_rect(rect);
    }

    /// Replace grid and swimlane settings (toolbar toggles).
    pub fn set_layout(&mut self, layout: LayoutSettings) {
        self.engine.session_mut().apply_layout(layout);
    }

    pub fn fit_to_content(&mut self) -> bool {
        let bounds = self.document.diagram().content_bounds();
        self.engine.viewport_mut().fit(bounds);
        bounds.is_some()
    }

    // ── Import / export ──

    /// Replace the diagram with an imported envelope. Undoable; on error
    /// nothing changes.
    pub fn import_json(&mut self, text: &str, now_ms: f64) -> Result<SanitizeReport, ImportError> {
        let imported = interchange::import_json(text)?;
        self.engine.cancel_gestures();
        let proposal = Proposal::push(vec![GraphMutation::ReplaceDiagram {
            diagram: Box::new(imported.diagram),
        }]);
        // ReplaceDiagram cannot fail.
        let _ = self.commit(proposal, now_ms);
        self.engine.session_mut().apply_layout(imported.layout);
        self.engine.selection_mut().clear();
        Ok(imported.report)
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        interchange::export_json(self.document.diagram(), &self.engine.session().layout())
    }

    /// Area a raster exporter should capture.
    pub fn export_bounds(&self) -> Option<Bounds> {
        export_bounds(self.document.diagram(), EXPORT_PADDING).ok()
    }

    // ── Persistence ──

    pub fn attach_store(&mut self, store: Box<dyn SnapshotStore>) {
        self.store = Some(store);
    }

    /// Replace the diagram with the stored snapshot and clear history.
    pub fn load(&mut self) -> bool {
        let Some(diagram) = self.store.as_ref().and_then(|s| s.load()) else {
            return false;
        };
        log::info!("loaded diagram with {} nodes", diagram.nodes.len());
        self.engine.cancel_gestures();
        self.document.reset(diagram);
        self.engine.selection_mut().clear();
        true
    }

    pub fn save(&mut self) -> SaveStatus {
        let Some(store) = self.store.as_mut() else {
            return SaveStatus::NoStore;
        };
        if store.save(self.document.diagram()) {
            SaveStatus::Saved
        } else {
            log::warn!("diagram not saved; keeping in-memory state");
            SaveStatus::NotSaved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fof_core::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn drop_entity_centres_snaps_and_selects() {
        let mut ed = Editor::default();
        let id = ed.drop_entity(EntityKind::Processor, 300.0, 200.0, 0.0).unwrap();
        let node = ed.diagram().node(id).unwrap();
        // Centre (300, 200) → top-left (210, 170) → snapped (200, 160).
        assert_eq!(node.position, Position::new(200.0, 160.0));
        assert_eq!(node.label, "Processor");
        assert_eq!(ed.selection().node_ids(), vec![id]);
    }

    #[test]
    fn nudges_merge_into_one_undo_step() {
        let mut ed = Editor::starter();
        ed.handle(&InputEvent::key_down("a", Modifiers { ctrl: true, ..Modifiers::NONE }), 0.0);
        for t in [0.0, 100.0, 200.0] {
            ed.handle(&InputEvent::key_down("ArrowRight", Modifiers::NONE), t);
        }
        let customer = NodeId::intern("starter_customer");
        assert_eq!(ed.diagram().node(customer).unwrap().position.x, 83.0);
        assert_eq!(ed.document().history().undo_depth(), 1);
        ed.undo();
        assert_eq!(ed.diagram().node(customer).unwrap().position.x, 80.0);
    }

    #[test]
    fn delete_selected_node_cascades() {
        let mut ed = Editor::starter();
        let processor = NodeId::intern("starter_processor");
        ed.engine.selection_mut().select_nodes([processor]);
        assert!(ed.delete_selection(0.0));
        assert!(ed.diagram().edges.is_empty());
        assert!(ed.selection().is_empty());
        ed.undo();
        assert_eq!(ed.diagram().edges.len(), 2);
    }

    #[test]
    fn field_edits_merge_and_sticky_defaults_update() {
        let mut ed = Editor::starter();
        let card = EdgeId::intern("starter_card");
        ed.set_edge_field(card, EdgeField::Label("C".into()), 0.0).unwrap();
        ed.set_edge_field(card, EdgeField::Label("Ca".into()), 300.0).unwrap();
        ed.set_edge_field(card, EdgeField::Label("Car".into()), 600.0).unwrap();
        assert_eq!(ed.document().history().undo_depth(), 1);

        ed.set_edge_field(card, EdgeField::Style(fof_core::model::LineStyle::Dashed), 650.0)
            .unwrap();
        assert_eq!(ed.document().history().undo_depth(), 2);
        assert_eq!(
            ed.session().edge_defaults.style,
            fof_core::model::LineStyle::Dashed
        );
    }

    #[test]
    fn unknown_field_target_is_an_error() {
        let mut ed = Editor::default();
        let err = ed
            .set_node_field(NodeId::intern("ed_ghost"), NodeField::Label("x".into()), 0.0)
            .unwrap_err();
        assert_eq!(err, DiagramError::UnknownNode(NodeId::intern("ed_ghost")));
    }

    #[test]
    fn save_reports_quota_failure() {
        let mut ed = Editor::starter();
        assert_eq!(ed.save(), SaveStatus::NoStore);
        ed.attach_store(Box::new(MemoryStore::with_quota(64)));
        assert_eq!(ed.save(), SaveStatus::NotSaved);
        assert_eq!(ed.diagram().nodes.len(), 3);

        ed.attach_store(Box::new(MemoryStore::new()));
        assert_eq!(ed.save(), SaveStatus::Saved);
        let mut fresh = Editor::default();
        fresh.store = ed.store.take();
        assert!(fresh.load());
        assert_eq!(fresh.diagram(), &starter_diagram());
    }

    #[test]
    fn import_is_undoable_and_bad_input_changes_nothing() {
        let mut ed = Editor::starter();
        let before = ed.diagram().clone();
        assert!(ed.import_json("{ not json", 0.0).is_err());
        assert_eq!(ed.diagram(), &before);

        let json = Editor::default().export_json().unwrap();
        ed.import_json(&json, 10.0).unwrap();
        assert!(ed.diagram().is_empty());
        ed.undo();
        assert_eq!(ed.diagram(), &before);
    }
}
