//! Selection state and marquee (rubber-band) selection.
//!
//! Node and edge selection are mutually exclusive. Node ids keep click
//! order; the first id is the primary node of a group drag.

use fof_core::id::{EdgeId, NodeId};
use fof_core::model::{Bounds, Diagram, Position};
use fof_render::hit::hit_test_rect;
use indexmap::IndexSet;

/// What the property inspector is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectorTarget {
    Node(NodeId),
    Edge(EdgeId),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    nodes: IndexSet<NodeId>,
    edge: Option<EdgeId>,
    inspector: Option<InspectorTarget>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the node selection and clear the edge selection.
    pub fn select_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.nodes = ids.into_iter().collect();
        self.edge = None;
        self.inspector = match self.nodes.len() {
            1 => self.nodes.first().copied().map(InspectorTarget::Node),
            _ => None,
        };
    }

    /// Replace the edge selection and clear the node selection.
    pub fn select_edge(&mut self, id: Option<EdgeId>) {
        self.nodes.clear();
        self.edge = id;
        self.inspector = id.map(InspectorTarget::Edge);
    }

    /// Shift-click: add if absent, remove if present.
    pub fn toggle_node(&mut self, id: NodeId) {
        self.edge = None;
        if !self.nodes.shift_remove(&id) {
            self.nodes.insert(id);
        }
        self.inspector = match self.nodes.len() {
            1 => self.nodes.first().copied().map(InspectorTarget::Node),
            _ => None,
        };
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edge = None;
        self.inspector = None;
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().copied().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// First-clicked selected node.
    pub fn primary(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn edge(&self) -> Option<EdgeId> {
        self.edge
    }

    pub fn inspector(&self) -> Option<InspectorTarget> {
        self.inspector
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edge.is_none()
    }

    /// Drop ids that no longer exist (after undo, delete or import).
    pub fn retain_existing(&mut self, diagram: &Diagram) {
        self.nodes.retain(|id| diagram.contains_node(*id));
        if let Some(edge) = self.edge
            && diagram.edge(edge).is_none()
        {
            self.edge = None;
        }
        self.inspector = match self.inspector {
            Some(InspectorTarget::Node(id)) if diagram.contains_node(id) => self.inspector,
            Some(InspectorTarget::Edge(id)) if diagram.edge(id).is_some() => self.inspector,
            _ => None,
        };
    }
}

// ─── Marquee ─────────────────────────────────────────────────────────────

/// An in-progress rubber-band selection in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Marquee {
    origin: Position,
    current: Position,
    base: Vec<NodeId>,
}

impl Marquee {
    /// Start at `origin`. With `additive` the current node selection is kept
    /// as the base that every update unions onto.
    pub fn begin(origin: Position, selection: &Selection, additive: bool) -> Self {
        let base = if additive {
            selection.node_ids()
        } else {
            Vec::new()
        };
        Self {
            origin,
            current: origin,
            base,
        }
    }

    pub fn rect(&self) -> Bounds {
        Bounds::from_corners(self.origin, self.current)
    }

    /// Move the free corner and recompute the selection as
    /// `base ∪ overlapping`.
    pub fn update(&mut self, world: Position, diagram: &Diagram, selection: &mut Selection) {
        self.current = world;
        let hits = hit_test_rect(diagram, &self.rect());
        log::trace!("marquee overlaps {} nodes", hits.len());
        selection.select_nodes(self.base.iter().copied().chain(hits));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fof_core::model::{EntityKind, Node};
    use pretty_assertions::assert_eq;

    fn grid() -> Diagram {
        let mut d = Diagram::new();
        for (id, x, y) in [("sel_a", 0.0, 0.0), ("sel_b", 300.0, 0.0), ("sel_c", 0.0, 300.0)] {
            d.add_node(Node::new(NodeId::intern(id), EntityKind::Bank, id, Position::new(x, y)))
                .unwrap();
        }
        d
    }

    #[test]
    fn node_and_edge_selection_are_exclusive() {
        let mut s = Selection::new();
        s.select_nodes([NodeId::intern("sel_a")]);
        assert_eq!(s.inspector(), Some(InspectorTarget::Node(NodeId::intern("sel_a"))));
        s.select_edge(Some(EdgeId::intern("sel_e")));
        assert_eq!(s.node_count(), 0);
        assert_eq!(s.inspector(), Some(InspectorTarget::Edge(EdgeId::intern("sel_e"))));
        s.toggle_node(NodeId::intern("sel_b"));
        assert_eq!(s.edge(), None);
    }

    #[test]
    fn toggle_keeps_click_order() {
        let mut s = Selection::new();
        let (a, b, c) = (NodeId::intern("sel_a"), NodeId::intern("sel_b"), NodeId::intern("sel_c"));
        s.toggle_node(b);
        s.toggle_node(a);
        s.toggle_node(c);
        s.toggle_node(a);
        assert_eq!(s.node_ids(), vec![b, c]);
        assert_eq!(s.primary(), Some(b));
        assert_eq!(s.inspector(), None);
    }

    #[test]
    fn marquee_selects_overlapping_only() {
        let d = grid();
        let mut s = Selection::new();
        let mut m = Marquee::begin(Position::new(-10.0, -10.0), &s, false);
        // Reaches 20px into sel_b (x 300..480) but nowhere near sel_c.
        m.update(Position::new(320.0, 40.0), &d, &mut s);
        assert_eq!(s.node_ids(), vec![NodeId::intern("sel_a"), NodeId::intern("sel_b")]);

        // Shrinking the rect drops sel_b again.
        m.update(Position::new(100.0, 40.0), &d, &mut s);
        assert_eq!(s.node_ids(), vec![NodeId::intern("sel_a")]);
    }

    #[test]
    fn additive_marquee_keeps_base() {
        let d = grid();
        let mut s = Selection::new();
        s.select_nodes([NodeId::intern("sel_c")]);
        let mut m = Marquee::begin(Position::new(290.0, -10.0), &s, true);
        m.update(Position::new(500.0, 100.0), &d, &mut s);
        assert_eq!(s.node_ids(), vec![NodeId::intern("sel_c"), NodeId::intern("sel_b")]);
    }

    #[test]
    fn retain_existing_drops_stale_ids() {
        let d = grid();
        let mut s = Selection::new();
        s.select_nodes([NodeId::intern("sel_a"), NodeId::intern("sel_gone")]);
        s.retain_existing(&d);
        assert_eq!(s.node_ids(), vec![NodeId::intern("sel_a")]);
    }
}
