//! The document: authoritative diagram plus its undo history.
//!
//! Every change goes through [`Document::commit`], which records the
//! pre-mutation snapshot according to a [`Record`] policy and then applies
//! the batch. Batches are atomic: they are applied to a working copy and
//! only swapped in when every mutation succeeds.

use crate::history::{History, HistoryConfig, MergeKey};
use crate::mutation::GraphMutation;
use fof_core::error::DiagramError;
use fof_core::model::{Diagram, EdgeEnd};

/// How a commit interacts with history.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Always push an undo step.
    Push,
    /// Push unless the previous record merged under the same key within
    /// `window_ms`.
    Merge { key: MergeKey, window_ms: f64 },
    /// Apply without touching history (later frames of one gesture).
    Skip,
}

/// A batch of mutations with its history policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub mutations: Vec<GraphMutation>,
    pub record: Record,
}

impl Proposal {
    pub fn push(mutations: Vec<GraphMutation>) -> Self {
        Self {
            mutations,
            record: Record::Push,
        }
    }

    pub fn merge(mutations: Vec<GraphMutation>, key: MergeKey, window_ms: f64) -> Self {
        Self {
            mutations,
            record: Record::Merge { key, window_ms },
        }
    }
}

/// Apply one mutation in place.
pub fn apply_mutation(diagram: &mut Diagram, mutation: GraphMutation) -> Result<(), DiagramError> {
    match mutation {
        GraphMutation::MoveNode {
            id,
            position,
            swimlane,
        } => {
            let node = diagram.node_mut(id).ok_or(DiagramError::UnknownNode(id))?;
            node.position = position;
            if swimlane.is_some() {
                node.swimlane_id = swimlane;
            }
        }
        GraphMutation::AddNode { node } => diagram.add_node(*node)?,
        GraphMutation::RemoveNodes { ids } => {
            let report = diagram.remove_nodes(&ids);
            log::debug!(
                "removed {} nodes, {} edges, {} handles",
                report.nodes.len(),
                report.edges.len(),
                report.pruned_handles.len()
            );
        }
        GraphMutation::AddEdge { edge } => diagram.add_edge(*edge)?,
        GraphMutation::RemoveEdge { id } => {
            if diagram.edge(id).is_none() {
                return Err(DiagramError::UnknownEdge(id));
            }
            diagram.remove_edges(&[id]);
        }
        GraphMutation::ReconnectEdge { id, end, node, port } => {
            if !diagram.contains_node(node) {
                return Err(DiagramError::UnknownNode(node));
            }
            let edge = diagram.edge_mut(id).ok_or(DiagramError::UnknownEdge(id))?;
            match end {
                EdgeEnd::Source => {
                    edge.source_id = node;
                    edge.source_port = port;
                }
                EdgeEnd::Target => {
                    edge.target_id = node;
                    edge.target_port = port;
                }
            }
            diagram.prune_orphan_handles();
        }
        GraphMutation::SetNodeField { id, field } => {
            let node = diagram.node_mut(id).ok_or(DiagramError::UnknownNode(id))?;
            field.apply(node)?;
        }
        GraphMutation::SetEdgeField { id, field } => {
            let edge = diagram.edge_mut(id).ok_or(DiagramError::UnknownEdge(id))?;
            field.apply(edge)?;
        }
        GraphMutation::AddDrawing { drawing } => diagram.add_drawing(*drawing),
        GraphMutation::ReplaceDiagram { diagram: next } => *diagram = *next,
    }
    Ok(())
}

/// Diagram + history.
#[derive(Debug, Default)]
pub struct Document {
    diagram: Diagram,
    history: History,
}

impl Document {
    pub fn new(diagram: Diagram) -> Self {
        Self::with_config(diagram, HistoryConfig::default())
    }

    pub fn with_config(diagram: Diagram, config: HistoryConfig) -> Self {
        Self {
            diagram,
            history: History::new(config.limit),
        }
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Record history per `proposal.record`, then apply the batch.
    ///
    /// Returns `Ok(false)` when the batch left the diagram unchanged (no
    /// history entry is taken in that case). On error nothing changes.
    pub fn commit(&mut self, proposal: Proposal, now_ms: f64) -> Result<bool, DiagramError> {
        let mut next = self.diagram.clone();
        for mutation in proposal.mutations {
            apply_mutation(&mut next, mutation)?;
        }
        if next == self.diagram {
            return Ok(false);
        }

        match proposal.record {
            Record::Push => self.history.push(&self.diagram),
            Record::Merge { key, window_ms } => {
                self.history.record(&self.diagram, key, window_ms, now_ms);
            }
            Record::Skip => {}
        }
        self.diagram = next;
        Ok(true)
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.diagram) {
            Some(previous) => {
                self.diagram = previous;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.diagram) {
            Some(next) => {
                self.diagram = next;
                true
            }
            None => false,
        }
    }

    /// Replace the diagram outright and forget history (initial load).
    pub fn reset(&mut self, diagram: Diagram) {
        self.diagram = diagram;
        self.history.clear();
    }
}
