//! Per-animation-frame position coalescing.
//!
//! Pointer moves can arrive several times per frame. Drag positions are
//! queued here keyed by node id (last write wins, first-insertion order
//! kept) and turned into mutations once per frame.

use crate::mutation::GraphMutation;
use fof_core::id::NodeId;
use fof_core::model::Position;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingMove {
    position: Position,
    swimlane: Option<u32>,
}

#[derive(Debug, Default)]
pub struct FrameCoalescer {
    pending: IndexMap<NodeId, PendingMove>,
}

impl FrameCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&mut self, id: NodeId, position: Position, swimlane: Option<u32>) {
        self.pending.insert(id, PendingMove { position, swimlane });
    }

    /// Forget a queued move (the node is back where the document has it).
    pub fn discard(&mut self, id: NodeId) {
        self.pending.shift_remove(&id);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Drain everything queued since the last flush.
    pub fn flush(&mut self) -> Vec<GraphMutation> {
        self.pending
            .drain(..)
            .map(|(id, m)| GraphMutation::MoveNode {
                id,
                position: m.position,
                swimlane: m.swimlane,
            })
            .collect()
    }

    /// Drop queued moves without applying them.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
