//! Drag-to-move for one or more selected nodes.
//!
//! The whole selection moves as a rigid body. When snapping is on, only the
//! primary node is snapped to the grid and the resulting delta is applied to
//! every other dragged node, so relative offsets never drift.

use crate::history::MergeKey;
use fof_core::id::NodeId;
use fof_core::layout::{GridSettings, LaneConfig};
use fof_core::model::{Diagram, Position};
use indexmap::IndexMap;

/// Alignment guide lines drawn at the primary node's snapped position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGuide {
    /// World x of the vertical guide.
    pub x: f32,
    /// World y of the horizontal guide.
    pub y: f32,
}

/// One node's target after a drag update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragMove {
    pub id: NodeId,
    pub position: Position,
    pub swimlane: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    primary: NodeId,
    pointer_start: Position,
    initial: IndexMap<NodeId, Position>,
    flushed: bool,
}

impl DragState {
    /// Capture start positions for `ids` (selection order). Ids missing
    /// from the diagram are skipped; `None` when nothing is left to drag.
    pub fn begin(diagram: &Diagram, ids: &[NodeId], pointer: Position) -> Option<Self> {
        let initial: IndexMap<NodeId, Position> = ids
            .iter()
            .filter_map(|id| diagram.node(*id).map(|n| (*id, n.position)))
            .collect();
        let primary = *initial.keys().next()?;
        log::debug!("drag begin: {} nodes, primary {primary}", initial.len());
        Some(Self {
            primary,
            pointer_start: pointer,
            initial,
            flushed: false,
        })
    }

    pub fn primary(&self) -> NodeId {
        self.primary
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.initial.keys().copied()
    }

    /// History key: the sorted dragged-id list.
    pub fn merge_key(&self) -> MergeKey {
        MergeKey::drag(self.ids())
    }

    /// True once, on the first flush of this gesture.
    pub fn take_first_flush(&mut self) -> bool {
        !std::mem::replace(&mut self.flushed, true)
    }

    /// Compute every node's target for the pointer at `pointer`.
    ///
    /// `bypass_snap` is the Alt modifier.
    pub fn update(
        &self,
        pointer: Position,
        grid: &GridSettings,
        lanes: &LaneConfig,
        bypass_snap: bool,
    ) -> (Vec<DragMove>, Option<SnapGuide>) {
        let mut dx = pointer.x - self.pointer_start.x;
        let mut dy = pointer.y - self.pointer_start.y;
        let mut guide = None;

        if grid.snap
            && !bypass_snap
            && let Some(start) = self.initial.get(&self.primary)
        {
            let sx = grid.snap_value(start.x + dx);
            let sy = grid.snap_value(start.y + dy);
            dx = sx - start.x;
            dy = sy - start.y;
            guide = Some(SnapGuide { x: sx, y: sy });
        }

        let moves = self
            .initial
            .iter()
            .map(|(id, start)| {
                let position = start.offset(dx, dy);
                DragMove {
                    id: *id,
                    position,
                    swimlane: lanes.assign(position.y),
                }
            })
            .collect();
        (moves, guide)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fof_core::layout::LaneGrouping;
    use fof_core::model::{EntityKind, Node};
    use pretty_assertions::assert_eq;

    fn diagram() -> Diagram {
        let mut d = Diagram::new();
        d.add_node(Node::new(
            NodeId::intern("drag_a"),
            EntityKind::Bank,
            "A",
            Position::new(13.0, 7.0),
        ))
        .unwrap();
        d.add_node(Node::new(
            NodeId::intern("drag_b"),
            EntityKind::Bank,
            "B",
            Position::new(200.0, 150.0),
        ))
        .unwrap();
        d
    }

    #[test]
    fn snap_moves_primary_to_grid_and_keeps_offsets() {
        let d = diagram();
        let ids = [NodeId::intern("drag_a"), NodeId::intern("drag_b")];
        let drag = DragState::begin(&d, &ids, Position::new(20.0, 20.0)).unwrap();
        let (moves, guide) = drag.update(
            Position::new(55.0, 46.0),
            &GridSettings::default(),
            &LaneConfig::default(),
            false,
        );

        // Raw target 48,33 snaps to 40,40 → delta 27,33.
        assert_eq!(moves[0].position, Position::new(40.0, 40.0));
        assert_eq!(moves[1].position, Position::new(227.0, 183.0));
        assert_eq!(guide, Some(SnapGuide { x: 40.0, y: 40.0 }));
    }

    #[test]
    fn snap_is_deterministic() {
        let d = diagram();
        let ids = [NodeId::intern("drag_a")];
        let drag = DragState::begin(&d, &ids, Position::ZERO).unwrap();
        let grid = GridSettings::default();
        let lanes = LaneConfig::default();
        let a = drag.update(Position::new(91.0, 3.0), &grid, &lanes, false);
        let b = drag.update(Position::new(91.0, 3.0), &grid, &lanes, false);
        assert_eq!(a, b);
    }

    #[test]
    fn alt_bypasses_snap() {
        let d = diagram();
        let drag = DragState::begin(&d, &[NodeId::intern("drag_a")], Position::ZERO).unwrap();
        let (moves, guide) = drag.update(
            Position::new(5.0, 5.0),
            &GridSettings::default(),
            &LaneConfig::default(),
            true,
        );
        assert_eq!(moves[0].position, Position::new(18.0, 12.0));
        assert_eq!(guide, None);
    }

    #[test]
    fn manual_lanes_follow_y() {
        let d = diagram();
        let drag = DragState::begin(&d, &[NodeId::intern("drag_b")], Position::ZERO).unwrap();
        let lanes = LaneConfig {
            grouping: LaneGrouping::Manual,
            ..LaneConfig::default()
        };
        let grid = GridSettings {
            snap: false,
            ..GridSettings::default()
        };
        let (moves, _) = drag.update(Position::new(0.0, 300.0), &grid, &lanes, false);
        assert_eq!(moves[0].swimlane, Some(3));
    }

    #[test]
    fn first_flush_flag_fires_once() {
        let d = diagram();
        let mut drag = DragState::begin(&d, &[NodeId::intern("drag_a")], Position::ZERO).unwrap();
        assert!(drag.take_first_flush());
        assert!(!drag.take_first_flush());
    }

    #[test]
    fn begin_with_only_unknown_ids_is_none() {
        let d = diagram();
        assert!(DragState::begin(&d, &[NodeId::intern("drag_ghost")], Position::ZERO).is_none());
    }
}
