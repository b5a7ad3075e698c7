//! Connection drawing: click-to-connect, direct port drags and endpoint
//! reconnection of the selected edge.
//!
//! ```text
//!   Idle ──click port/node──▶ Pending ──click other node──▶ Idle (+edge)
//!     │                          └──same node / background / Esc──▶ Idle
//!     ├──press port, drag──▶ DirectDrag ──release on other port──▶ Idle (+edge)
//!     └──press edge handle──▶ Reconnect ──release on node──▶ Idle (edge re-targeted)
//! ```

use crate::mutation::GraphMutation;
use crate::session::EdgeDefaults;
use fof_core::geometry::{closest_port, port_position};
use fof_core::id::{EdgeId, NodeId};
use fof_core::model::{Diagram, Edge, EdgeEnd, PaymentRail, Port, Position};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    /// Waiting for a second click on the target.
    Pending {
        source: NodeId,
        port: Port,
        pointer: Position,
    },
    /// Dragging out of a port handle with the button held.
    DirectDrag {
        source: NodeId,
        port: Port,
        pointer: Position,
    },
    /// Dragging one endpoint of an existing edge.
    Reconnect {
        edge: EdgeId,
        end: EdgeEnd,
        pointer: Position,
    },
}

/// Result of feeding a click or release into the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectStep {
    Nothing,
    Started,
    Cancelled,
    /// Commit `mutation`, then select `select`.
    Commit {
        mutation: GraphMutation,
        select: EdgeId,
    },
}

#[derive(Debug, Default)]
pub struct Connector {
    state: ConnectionState,
}

fn new_edge(source: NodeId, port: Port, target: NodeId, target_port: Port, defaults: &EdgeDefaults) -> Edge {
    let mut edge = Edge::new(EdgeId::with_prefix("edge"), source, port, target, target_port);
    edge.rail = PaymentRail::Blank;
    defaults.apply(&mut edge);
    edge
}

fn create(source: NodeId, port: Port, target: NodeId, target_port: Port, defaults: &EdgeDefaults) -> ConnectStep {
    let edge = new_edge(source, port, target, target_port, defaults);
    log::debug!("connect {source}:{port:?} → {target}:{target_port:?} as {}", edge.id);
    ConnectStep::Commit {
        select: edge.id,
        mutation: GraphMutation::AddEdge {
            edge: Box::new(edge),
        },
    }
}

impl Connector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ConnectionState::Idle
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ConnectionState::Pending { .. })
    }

    /// Escape, tool switch, or a drag/marquee starting.
    pub fn cancel(&mut self) -> bool {
        let was_active = !self.is_idle();
        if was_active {
            log::debug!("connection cancelled");
        }
        self.state = ConnectionState::Idle;
        was_active
    }

    /// Connect-tool click. `target` is the clicked port, or the clicked
    /// node resolved to its closest port; `None` for empty canvas.
    pub fn click(
        &mut self,
        target: Option<(NodeId, Port)>,
        pointer: Position,
        defaults: &EdgeDefaults,
    ) -> ConnectStep {
        match (self.state, target) {
            (ConnectionState::Pending { source, port, .. }, Some((node, node_port))) => {
                self.state = ConnectionState::Idle;
                if node == source {
                    log::debug!("connection cancelled: clicked the source again");
                    ConnectStep::Cancelled
                } else {
                    create(source, port, node, node_port, defaults)
                }
            }
            (ConnectionState::Pending { .. }, None) => {
                self.cancel();
                ConnectStep::Cancelled
            }
            (_, Some((source, port))) => {
                self.state = ConnectionState::Pending {
                    source,
                    port,
                    pointer,
                };
                ConnectStep::Started
            }
            (_, None) => ConnectStep::Nothing,
        }
    }

    pub fn begin_direct(&mut self, source: NodeId, port: Port, pointer: Position) {
        self.state = ConnectionState::DirectDrag {
            source,
            port,
            pointer,
        };
    }

    pub fn begin_reconnect(&mut self, edge: EdgeId, end: EdgeEnd, pointer: Position) {
        log::debug!("reconnect {edge} {end:?}");
        self.state = ConnectionState::Reconnect { edge, end, pointer };
    }

    /// Track the pointer for the preview. Returns whether anything changed.
    pub fn pointer_move(&mut self, world: Position) -> bool {
        match &mut self.state {
            ConnectionState::Idle => false,
            ConnectionState::Pending { pointer, .. }
            | ConnectionState::DirectDrag { pointer, .. }
            | ConnectionState::Reconnect { pointer, .. } => {
                *pointer = world;
                true
            }
        }
    }

    /// Finish a direct drag or reconnect. `port` is the port under the
    /// pointer, `node` the topmost node under it.
    pub fn release(
        &mut self,
        diagram: &Diagram,
        port: Option<(NodeId, Port)>,
        node: Option<NodeId>,
        pointer: Position,
        defaults: &EdgeDefaults,
    ) -> ConnectStep {
        match self.state {
            ConnectionState::DirectDrag {
                source,
                port: source_port,
                ..
            } => {
                self.state = ConnectionState::Idle;
                match port {
                    Some((target, target_port)) if target != source => {
                        create(source, source_port, target, target_port, defaults)
                    }
                    _ => ConnectStep::Cancelled,
                }
            }
            ConnectionState::Reconnect { edge, end, .. } => {
                self.state = ConnectionState::Idle;
                let Some(current) = diagram.edge(edge) else {
                    return ConnectStep::Cancelled;
                };
                let opposite = match end {
                    EdgeEnd::Source => current.target_id,
                    EdgeEnd::Target => current.source_id,
                };
                let drop = node.or(port.map(|(n, _)| n));
                match drop.and_then(|id| diagram.node(id)) {
                    Some(target) if target.id != opposite => ConnectStep::Commit {
                        mutation: GraphMutation::ReconnectEdge {
                            id: edge,
                            end,
                            node: target.id,
                            port: closest_port(target, pointer),
                        },
                        select: edge,
                    },
                    _ => ConnectStep::Cancelled,
                }
            }
            ConnectionState::Idle | ConnectionState::Pending { .. } => ConnectStep::Nothing,
        }
    }

    /// Preview line for the current state: `(fixed end, pointer)`.
    pub fn preview(&self, diagram: &Diagram) -> Option<(Position, Position)> {
        match self.state {
            ConnectionState::Idle => None,
            ConnectionState::Pending {
                source,
                port,
                pointer,
            }
            | ConnectionState::DirectDrag {
                source,
                port,
                pointer,
            } => diagram
                .node(source)
                .map(|n| (port_position(n, port), pointer)),
            ConnectionState::Reconnect { edge, end, pointer } => {
                let edge = diagram.edge(edge)?;
                let (fixed, fixed_port) = match end {
                    EdgeEnd::Source => (edge.target_id, edge.target_port),
                    EdgeEnd::Target => (edge.source_id, edge.source_port),
                };
                diagram
                    .node(fixed)
                    .map(|n| (port_position(n, fixed_port), pointer))
            }
        }
    }

    /// Edge whose endpoint is being dragged, hidden while it is re-targeted.
    pub fn reconnecting(&self) -> Option<EdgeId> {
        match self.state {
            ConnectionState::Reconnect { edge, .. } => Some(edge),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fof_core::model::{EntityKind, LineStyle, Node};
    use pretty_assertions::assert_eq;

    fn diagram() -> Diagram {
        let mut d = Diagram::new();
        for (id, x, y) in [("cn_a", 0.0, 0.0), ("cn_b", 400.0, 0.0), ("cn_c", 400.0, 300.0)] {
            d.add_node(Node::new(NodeId::intern(id), EntityKind::Bank, id, Position::new(x, y)))
                .unwrap();
        }
        d.add_edge(Edge::new(
            EdgeId::intern("cn_e"),
            NodeId::intern("cn_a"),
            Port::Right,
            NodeId::intern("cn_b"),
            Port::Left,
        ))
        .unwrap();
        d
    }

    #[test]
    fn click_click_creates_edge_with_defaults() {
        let mut c = Connector::new();
        let defaults = EdgeDefaults {
            style: LineStyle::Dotted,
            ..EdgeDefaults::default()
        };
        let a = NodeId::intern("cn_a");
        let b = NodeId::intern("cn_b");
        assert_eq!(
            c.click(Some((a, Port::Right)), Position::ZERO, &defaults),
            ConnectStep::Started
        );
        assert!(c.is_pending());

        let step = c.click(Some((b, Port::Left)), Position::ZERO, &defaults);
        let ConnectStep::Commit {
            mutation: GraphMutation::AddEdge { edge },
            select,
        } = step
        else {
            panic!("expected an AddEdge commit, got {step:?}");
        };
        assert_eq!(select, edge.id);
        assert_eq!((edge.source_id, edge.source_port), (a, Port::Right));
        assert_eq!((edge.target_id, edge.target_port), (b, Port::Left));
        assert_eq!(edge.rail, PaymentRail::Blank);
        assert_eq!(edge.style, LineStyle::Dotted);
        assert!(c.is_idle());
    }

    #[test]
    fn clicking_source_or_background_cancels() {
        let mut c = Connector::new();
        let d = EdgeDefaults::default();
        let a = NodeId::intern("cn_a");
        c.click(Some((a, Port::Top)), Position::ZERO, &d);
        assert_eq!(c.click(Some((a, Port::Bottom)), Position::ZERO, &d), ConnectStep::Cancelled);
        assert!(c.is_idle());

        c.click(Some((a, Port::Top)), Position::ZERO, &d);
        assert_eq!(c.click(None, Position::ZERO, &d), ConnectStep::Cancelled);
        assert!(c.is_idle());
    }

    #[test]
    fn direct_drag_requires_other_port() {
        let d = diagram();
        let defaults = EdgeDefaults::default();
        let a = NodeId::intern("cn_a");
        let mut c = Connector::new();

        c.begin_direct(a, Port::Right, Position::ZERO);
        let dropped_on_body = c.release(&d, None, Some(NodeId::intern("cn_b")), Position::ZERO, &defaults);
        assert_eq!(dropped_on_body, ConnectStep::Cancelled);

        c.begin_direct(a, Port::Right, Position::ZERO);
        let own_port = c.release(&d, Some((a, Port::Left)), Some(a), Position::ZERO, &defaults);
        assert_eq!(own_port, ConnectStep::Cancelled);

        c.begin_direct(a, Port::Right, Position::ZERO);
        let step = c.release(
            &d,
            Some((NodeId::intern("cn_c"), Port::Top)),
            Some(NodeId::intern("cn_c")),
            Position::ZERO,
            &defaults,
        );
        assert!(matches!(step, ConnectStep::Commit { .. }));
    }

    #[test]
    fn reconnect_uses_closest_port_at_drop() {
        let d = diagram();
        let mut c = Connector::new();
        let e = EdgeId::intern("cn_e");
        c.begin_reconnect(e, EdgeEnd::Target, Position::ZERO);
        // Just above cn_c's top edge centre (490, 300).
        let drop = Position::new(490.0, 305.0);
        let step = c.release(&d, None, Some(NodeId::intern("cn_c")), drop, &EdgeDefaults::default());
        assert_eq!(
            step,
            ConnectStep::Commit {
                mutation: GraphMutation::ReconnectEdge {
                    id: e,
                    end: EdgeEnd::Target,
                    node: NodeId::intern("cn_c"),
                    port: Port::Top,
                },
                select: e,
            }
        );
    }

    #[test]
    fn reconnect_onto_opposite_end_or_background_cancels() {
        let d = diagram();
        let mut c = Connector::new();
        let e = EdgeId::intern("cn_e");
        c.begin_reconnect(e, EdgeEnd::Target, Position::ZERO);
        let step = c.release(&d, None, Some(NodeId::intern("cn_a")), Position::ZERO, &EdgeDefaults::default());
        assert_eq!(step, ConnectStep::Cancelled);

        c.begin_reconnect(e, EdgeEnd::Source, Position::ZERO);
        let step = c.release(&d, None, None, Position::new(-500.0, -500.0), &EdgeDefaults::default());
        assert_eq!(step, ConnectStep::Cancelled);
        assert!(c.is_idle());
    }

    #[test]
    fn preview_starts_at_source_port() {
        let d = diagram();
        let mut c = Connector::new();
        c.click(
            Some((NodeId::intern("cn_a"), Port::Right)),
            Position::ZERO,
            &EdgeDefaults::default(),
        );
        c.pointer_move(Position::new(250.0, 90.0));
        assert_eq!(
            c.preview(&d),
            Some((Position::new(180.0, 30.0), Position::new(250.0, 90.0)))
        );
    }
}
