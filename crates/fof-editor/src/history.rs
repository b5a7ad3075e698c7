//! Undo/redo snapshot history.
//!
//! Every undoable step stores a full clone of the diagram taken *before*
//! the mutation. Undo swaps the current diagram with the top of `past`,
//! redo mirrors it. History is linear: any new record clears the future.
//!
//! Rapid repeated edits to the same thing (a drag, arrow-key nudges,
//! typing into an inspector field) collapse into one step through a merge
//! key and a sliding time window.

use fof_core::id::{EdgeId, NodeId};
use fof_core::model::Diagram;
use smallvec::SmallVec;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Merge windows in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeWindows {
    pub drag_ms: f64,
    pub nudge_ms: f64,
    pub field_ms: f64,
}

impl Default for MergeWindows {
    fn default() -> Self {
        Self {
            drag_ms: 150.0,
            nudge_ms: 500.0,
            field_ms: 700.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryConfig {
    pub limit: usize,
    pub windows: MergeWindows,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
            windows: MergeWindows::default(),
        }
    }
}

/// Identity of a mergeable edit. Two records merge only when their keys
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeKey {
    /// Dragging this (sorted) set of nodes.
    Drag(SmallVec<[NodeId; 4]>),
    /// Arrow-key nudging this (sorted) set of nodes.
    Nudge(SmallVec<[NodeId; 4]>),
    NodeField(NodeId, &'static str),
    EdgeField(EdgeId, &'static str),
}

fn sorted(ids: impl IntoIterator<Item = NodeId>) -> SmallVec<[NodeId; 4]> {
    let mut ids: SmallVec<[NodeId; 4]> = ids.into_iter().collect();
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ids.dedup();
    ids
}

impl MergeKey {
    pub fn drag(ids: impl IntoIterator<Item = NodeId>) -> Self {
        MergeKey::Drag(sorted(ids))
    }

    pub fn nudge(ids: impl IntoIterator<Item = NodeId>) -> Self {
        MergeKey::Nudge(sorted(ids))
    }
}

/// Bounded linear undo/redo stacks of diagram snapshots.
#[derive(Debug)]
pub struct History {
    past: VecDeque<Diagram>,
    future: VecDeque<Diagram>,
    limit: usize,
    last: Option<(MergeKey, f64)>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            future: VecDeque::new(),
            limit: limit.max(1),
            last: None,
        }
    }

    fn push_bounded(stack: &mut VecDeque<Diagram>, snapshot: Diagram, limit: usize) {
        stack.push_back(snapshot);
        while stack.len() > limit {
            stack.pop_front();
        }
    }

    /// Record `current` as an undo step and clear redo.
    pub fn push(&mut self, current: &Diagram) {
        Self::push_bounded(&mut self.past, current.clone(), self.limit);
        self.future.clear();
        self.last = None;
    }

    /// Record unless the previous record had the same key and happened at
    /// most `window_ms` ago. The window slides: a merged record refreshes
    /// the timestamp. Returns whether a snapshot was pushed.
    pub fn record(&mut self, current: &Diagram, key: MergeKey, window_ms: f64, now_ms: f64) -> bool {
        let merge = matches!(
            &self.last,
            Some((last_key, at)) if *last_key == key && now_ms - at <= window_ms
        );
        if merge {
            log::trace!("history merge {key:?}");
            self.last = Some((key, now_ms));
            return false;
        }
        self.push(current);
        self.last = Some((key, now_ms));
        true
    }

    /// Step back. Returns the snapshot to restore; `current` moves to redo.
    pub fn undo(&mut self, current: &Diagram) -> Option<Diagram> {
        let previous = self.past.pop_back()?;
        Self::push_bounded(&mut self.future, current.clone(), self.limit);
        self.last = None;
        Some(previous)
    }

    /// Step forward. Returns the snapshot to restore; `current` moves to undo.
    pub fn redo(&mut self, current: &Diagram) -> Option<Diagram> {
        let next = self.future.pop_back()?;
        Self::push_bounded(&mut self.past, current.clone(), self.limit);
        self.last = None;
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fof_core::model::{EntityKind, Node, Position};
    use pretty_assertions::assert_eq;

    fn diagram_with(n: usize) -> Diagram {
        let mut d = Diagram::new();
        for i in 0..n {
            d.add_node(Node::new(
                NodeId::intern(&format!("hist_{i}")),
                EntityKind::Bank,
                "B",
                Position::new(i as f32 * 10.0, 0.0),
            ))
            .unwrap();
        }
        d
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut h = History::default();
        let s0 = diagram_with(0);
        let s1 = diagram_with(1);
        let s2 = diagram_with(2);

        h.push(&s0);
        h.push(&s1);
        let mut current = s2.clone();

        current = h.undo(&current).unwrap();
        assert_eq!(current, s1);
        current = h.undo(&current).unwrap();
        assert_eq!(current, s0);
        assert!(h.undo(&current).is_none());

        current = h.redo(&current).unwrap();
        assert_eq!(current, s1);
        current = h.redo(&current).unwrap();
        assert_eq!(current, s2);
        assert!(!h.can_redo());
    }

    #[test]
    fn new_push_clears_redo() {
        let mut h = History::default();
        h.push(&diagram_with(0));
        let _ = h.undo(&diagram_with(1)).unwrap();
        assert!(h.can_redo());
        h.push(&diagram_with(3));
        assert!(!h.can_redo());
    }

    #[test]
    fn stacks_are_capped() {
        let mut h = History::new(100);
        let d = diagram_with(0);
        for _ in 0..150 {
            h.push(&d);
        }
        assert_eq!(h.undo_depth(), 100);
    }

    #[test]
    fn same_key_within_window_merges() {
        let mut h = History::default();
        let d = diagram_with(1);
        let key = MergeKey::nudge([NodeId::intern("hist_0")]);
        assert!(h.record(&d, key.clone(), 500.0, 0.0));
        assert!(!h.record(&d, key.clone(), 500.0, 400.0));
        // Sliding: 800 is within 500 of the merged record at 400.
        assert!(!h.record(&d, key.clone(), 500.0, 800.0));
        assert!(h.record(&d, key, 500.0, 1400.0));
        assert_eq!(h.undo_depth(), 2);
    }

    #[test]
    fn different_key_always_pushes() {
        let mut h = History::default();
        let d = diagram_with(1);
        let a = MergeKey::NodeField(NodeId::intern("hist_0"), "label");
        let b = MergeKey::NodeField(NodeId::intern("hist_0"), "color");
        assert!(h.record(&d, a, 700.0, 0.0));
        assert!(h.record(&d, b, 700.0, 10.0));
        assert_eq!(h.undo_depth(), 2);
    }

    #[test]
    fn drag_keys_ignore_selection_order() {
        let a = NodeId::intern("hist_a");
        let b = NodeId::intern("hist_b");
        assert_eq!(MergeKey::drag([a, b]), MergeKey::drag([b, a]));
    }
}
