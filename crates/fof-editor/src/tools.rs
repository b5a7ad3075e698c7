//! Tool modes and the stroke-style tools.
//!
//! Select, connect and hand are interpreted directly by the canvas engine
//! since they depend on hit testing. Pen and connector are self-contained
//! press-drag-release tools that turn world positions into mutations.
//!
//! | Tool      | Key | Press                 | Drag          | Release              |
//! |-----------|-----|-----------------------|---------------|----------------------|
//! | select    | V   | select / start drag   | move, marquee | commit               |
//! | connect   | C   | pick source / target  | —             | —                    |
//! | connector | L   | first handle          | stretch       | two anchors + edge   |
//! | pen       | P   | first point           | add points    | drawing path         |
//! | hand      | H   | start pan             | pan           | —                    |

use crate::mutation::GraphMutation;
use crate::session::SessionState;
use fof_core::geometry::squared_distance;
use fof_core::id::{DrawingId, EdgeId, NodeId};
use fof_core::model::{DrawingPath, Edge, Node, PaymentRail, Port, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Connect,
    Connector,
    Pen,
    Hand,
}

impl ToolKind {
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Connect => "connect",
            ToolKind::Connector => "connector",
            ToolKind::Pen => "pen",
            ToolKind::Hand => "hand",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "select" => Some(ToolKind::Select),
            "connect" => Some(ToolKind::Connect),
            "connector" => Some(ToolKind::Connector),
            "pen" => Some(ToolKind::Pen),
            "hand" => Some(ToolKind::Hand),
            _ => None,
        }
    }

    /// Tools that may start a direct connection from a port handle.
    pub fn allows_port_drag(self) -> bool {
        !matches!(self, ToolKind::Pen | ToolKind::Hand)
    }
}

/// Pointer phase fed to a stroke tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPhase {
    Down,
    Move,
    Up,
}

/// A press-drag-release tool working in world coordinates.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Feed one pointer phase; returns mutations to commit (on release).
    fn handle(&mut self, phase: ToolPhase, world: Position, session: &SessionState) -> Vec<GraphMutation>;

    /// Abort without producing anything.
    fn cancel(&mut self);
}

// ─── Pen Tool ────────────────────────────────────────────────────────────

/// Points closer than this to the previous one are dropped.
const PEN_MIN_STEP: f32 = 1.5;

#[derive(Debug, Default)]
pub struct PenTool {
    points: Vec<Position>,
    drawing: bool,
}

impl PenTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live stroke for the renderer.
    pub fn points(&self) -> &[Position] {
        &self.points
    }
}

impl Tool for PenTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pen
    }

    fn handle(&mut self, phase: ToolPhase, world: Position, session: &SessionState) -> Vec<GraphMutation> {
        match phase {
            ToolPhase::Down => {
                self.drawing = true;
                self.points.clear();
                self.points.push(world);
                vec![]
            }
            ToolPhase::Move => {
                if self.drawing
                    && self
                        .points
                        .last()
                        .is_none_or(|p| squared_distance(*p, world) >= PEN_MIN_STEP * PEN_MIN_STEP)
                {
                    self.points.push(world);
                }
                vec![]
            }
            ToolPhase::Up => {
                if !self.drawing {
                    return vec![];
                }
                self.drawing = false;
                if self.points.last() != Some(&world) {
                    self.points.push(world);
                }
                let points = std::mem::take(&mut self.points);
                if points.len() < 2 {
                    return vec![];
                }
                let drawing = DrawingPath {
                    id: DrawingId::with_prefix("drawing"),
                    points,
                    color: session.pen.color.clone(),
                    width: session.pen.width,
                };
                log::debug!("pen stroke {} with {} points", drawing.id, drawing.points.len());
                vec![GraphMutation::AddDrawing {
                    drawing: Box::new(drawing),
                }]
            }
        }
    }

    fn cancel(&mut self) {
        self.drawing = false;
        self.points.clear();
    }
}

// ─── Connector Tool ──────────────────────────────────────────────────────

/// Shorter drags than this (world units) create nothing.
const CONNECTOR_MIN_LENGTH: f32 = 8.0;

/// Free-floating connector: two handle anchors joined by an edge.
#[derive(Debug, Default)]
pub struct ConnectorTool {
    segment: Option<(Position, Position)>,
}

impl ConnectorTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment(&self) -> Option<(Position, Position)> {
        self.segment
    }
}

impl Tool for ConnectorTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Connector
    }

    fn handle(&mut self, phase: ToolPhase, world: Position, session: &SessionState) -> Vec<GraphMutation> {
        match phase {
            ToolPhase::Down => {
                self.segment = Some((world, world));
                vec![]
            }
            ToolPhase::Move => {
                if let Some((_, end)) = &mut self.segment {
                    *end = world;
                }
                vec![]
            }
            ToolPhase::Up => {
                let Some((start, _)) = self.segment.take() else {
                    return vec![];
                };
                if squared_distance(start, world) < CONNECTOR_MIN_LENGTH * CONNECTOR_MIN_LENGTH {
                    return vec![];
                }
                let source = Node::anchor(NodeId::with_prefix("handle"), start);
                let target = Node::anchor(NodeId::with_prefix("handle"), world);
                let mut edge = Edge::new(
                    EdgeId::with_prefix("edge"),
                    source.id,
                    Port::Right,
                    target.id,
                    Port::Left,
                );
                edge.rail = PaymentRail::Blank;
                session.edge_defaults.apply(&mut edge);
                vec![
                    GraphMutation::AddNode {
                        node: Box::new(source),
                    },
                    GraphMutation::AddNode {
                        node: Box::new(target),
                    },
                    GraphMutation::AddEdge {
                        edge: Box::new(edge),
                    },
                ]
            }
        }
    }

    fn cancel(&mut self) {
        self.segment = None;
    }
}
