//! Canvas interaction engine.
//!
//! Turns normalized pointer and wheel input into selection changes,
//! viewport changes and proposed graph mutations. The engine never touches
//! the diagram itself: it reads it by reference and hands back
//! [`Proposal`]s for the document to commit.
//!
//! One [`Gesture`] is live at a time. Starting a new press ends whatever
//! was running before it.

use crate::connect::{ConnectStep, ConnectionState, Connector};
use crate::document::{Proposal, Record};
use crate::drag::{DragState, SnapGuide};
use crate::frame::FrameCoalescer;
use crate::history::MergeWindows;
use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::mutation::GraphMutation;
use crate::selection::{Marquee, Selection};
use crate::session::SessionState;
use crate::tools::{ConnectorTool, PenTool, Tool, ToolKind, ToolPhase};
use crate::viewport::ViewportController;
use fof_core::geometry::{closest_port, squared_distance};
use fof_core::id::NodeId;
use fof_core::model::{Bounds, Diagram, Port, Position};
use fof_core::viewport::ContainerRect;
use fof_render::hit::{Hit, hit_test, hit_test_node, hit_test_port};
use fof_render::route::route_all;

/// Screen pixels the pointer must travel before a press becomes a drag.
pub const DRAG_THRESHOLD: f32 = 3.0;

/// What the host should do after an event.
#[derive(Debug, Default, PartialEq)]
pub struct EngineOutput {
    pub proposals: Vec<Proposal>,
    pub redraw: bool,
}

impl EngineOutput {
    fn redraw() -> Self {
        Self {
            proposals: Vec::new(),
            redraw: true,
        }
    }

    fn with(proposal: Proposal) -> Self {
        Self {
            proposals: vec![proposal],
            redraw: true,
        }
    }

    fn push(&mut self, proposal: Option<Proposal>) {
        if let Some(p) = proposal {
            self.proposals.push(p);
            self.redraw = true;
        }
    }
}

#[derive(Debug, Default)]
enum Gesture {
    #[default]
    None,
    /// Pressed a node; not yet past the drag threshold.
    Press {
        node: NodeId,
        down_client: Position,
        down_world: Position,
        /// Collapse a multi-selection to `node` if this ends as a click.
        collapse: bool,
    },
    Drag(DragState),
    Marquee(Marquee),
    Pan,
    /// Pressed a port handle; becomes a direct connection once dragged.
    PortPress {
        node: NodeId,
        port: Port,
        down_client: Position,
    },
    /// Direct connection or endpoint reconnect in progress.
    Connecting,
    Stroke,
    Connector,
}

fn past_threshold(a: Position, b: Position) -> bool {
    squared_distance(a, b) > DRAG_THRESHOLD * DRAG_THRESHOLD
}

/// Flush queued drag positions. The first flush of a gesture carries the
/// drag merge key; later ones skip history.
fn drain(coalescer: &mut FrameCoalescer, drag: &mut DragState, window_ms: f64) -> Option<Proposal> {
    if coalescer.is_empty() {
        return None;
    }
    let mutations = coalescer.flush();
    let record = if drag.take_first_flush() {
        Record::Merge {
            key: drag.merge_key(),
            window_ms,
        }
    } else {
        Record::Skip
    };
    Some(Proposal { mutations, record })
}

pub struct CanvasEngine {
    session: SessionState,
    selection: Selection,
    connector: Connector,
    viewport: ViewportController,
    coalescer: FrameCoalescer,
    windows: MergeWindows,
    pen: PenTool,
    connector_tool: ConnectorTool,
    gesture: Gesture,
    snap_guide: Option<SnapGuide>,
}

impl Default for CanvasEngine {
    fn default() -> Self {
        Self::new(SessionState::default(), ContainerRect::default())
    }
}

impl CanvasEngine {
    pub fn new(session: SessionState, rect: ContainerRect) -> Self {
        Self {
            session,
            selection: Selection::new(),
            connector: Connector::new(),
            viewport: ViewportController::new(rect),
            coalescer: FrameCoalescer::new(),
            windows: MergeWindows::default(),
            pen: PenTool::new(),
            connector_tool: ConnectorTool::new(),
            gesture: Gesture::None,
            snap_guide: None,
        }
    }

    pub fn with_windows(mut self, windows: MergeWindows) -> Self {
        self.windows = windows;
        self
    }

    // ── Accessors ──

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportController {
        &mut self.viewport
    }

    pub fn connection(&self) -> ConnectionState {
        self.connector.state()
    }

    pub fn snap_guide(&self) -> Option<SnapGuide> {
        self.snap_guide
    }

    pub fn marquee_rect(&self) -> Option<Bounds> {
        match &self.gesture {
            Gesture::Marquee(m) => Some(m.rect()),
            _ => None,
        }
    }

    /// `(fixed end, pointer)` of the connection preview, if any.
    pub fn connection_preview(&self, diagram: &Diagram) -> Option<(Position, Position)> {
        self.connector.preview(diagram)
    }

    /// Edge being re-targeted; renderers hide it in favour of the preview.
    pub fn reconnecting(&self) -> Option<fof_core::id::EdgeId> {
        self.connector.reconnecting()
    }

    pub fn pen_points(&self) -> &[Position] {
        self.pen.points()
    }

    pub fn connector_segment(&self) -> Option<(Position, Position)> {
        self.connector_tool.segment()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Drag(_))
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Pan)
    }

    // ── Commands ──

    /// Switch tools, ending any live gesture and pending connection.
    pub fn set_tool(&mut self, tool: ToolKind) -> EngineOutput {
        let mut out = EngineOutput::redraw();
        out.push(self.end_gesture());
        self.connector.cancel();
        if self.session.tool != tool {
            log::debug!("tool {} → {}", self.session.tool.name(), tool.name());
        }
        self.session.tool = tool;
        out
    }

    /// Escape: end the gesture, drop a pending connection and deselect.
    pub fn escape(&mut self) -> EngineOutput {
        let mut out = EngineOutput::redraw();
        out.push(self.end_gesture());
        self.connector.cancel();
        self.selection.clear();
        out
    }

    /// Forget every in-flight gesture without committing (undo/redo/import).
    pub fn cancel_gestures(&mut self) {
        self.gesture = Gesture::None;
        self.coalescer.clear();
        self.connector.cancel();
        self.pen.cancel();
        self.connector_tool.cancel();
        self.viewport.end_pan();
        self.snap_guide = None;
    }

    /// Once per animation frame: commit coalesced drag positions.
    pub fn flush_frame(&mut self) -> Option<Proposal> {
        let Gesture::Drag(drag) = &mut self.gesture else {
            return None;
        };
        drain(&mut self.coalescer, drag, self.windows.drag_ms)
    }

    /// End the live gesture, committing whatever it still holds.
    fn end_gesture(&mut self) -> Option<Proposal> {
        self.snap_guide = None;
        match std::mem::take(&mut self.gesture) {
            Gesture::Drag(mut drag) => drain(&mut self.coalescer, &mut drag, self.windows.drag_ms),
            Gesture::Pan => {
                self.viewport.end_pan();
                None
            }
            Gesture::Connecting => {
                self.connector.cancel();
                None
            }
            Gesture::Stroke => {
                self.pen.cancel();
                None
            }
            Gesture::Connector => {
                self.connector_tool.cancel();
                None
            }
            Gesture::None | Gesture::Press { .. } | Gesture::Marquee(_) | Gesture::PortPress { .. } => {
                None
            }
        }
    }

    // ── Input ──

    pub fn handle(&mut self, diagram: &Diagram, event: &InputEvent) -> EngineOutput {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => self.pointer_down(diagram, Position::new(*x, *y), *button, *modifiers),
            InputEvent::PointerMove { x, y, modifiers } => {
                self.pointer_move(diagram, Position::new(*x, *y), *modifiers)
            }
            InputEvent::PointerUp { x, y, .. } => self.pointer_up(diagram, Position::new(*x, *y)),
            InputEvent::Wheel {
                x,
                y,
                dx,
                dy,
                modifiers,
            } => {
                self.viewport
                    .wheel(Position::new(*x, *y), *dx, *dy, modifiers.command());
                EngineOutput::redraw()
            }
            InputEvent::KeyDown { .. } | InputEvent::KeyUp { .. } => EngineOutput::default(),
        }
    }

    fn pointer_down(
        &mut self,
        diagram: &Diagram,
        client: Position,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> EngineOutput {
        let world = self.viewport.to_world(client.x, client.y);
        let mut out = EngineOutput::default();
        // A press while a gesture is still live means its release was lost.
        out.push(self.end_gesture());

        let pan = button == PointerButton::Middle
            || (button == PointerButton::Primary && self.session.space_held)
            || self.session.tool == ToolKind::Hand;
        if pan {
            self.viewport.begin_pan(client);
            self.gesture = Gesture::Pan;
            return out;
        }
        if button != PointerButton::Primary {
            return out;
        }

        let next = match self.session.tool {
            ToolKind::Pen => {
                self.connector.cancel();
                self.pen.handle(ToolPhase::Down, world, &self.session);
                self.gesture = Gesture::Stroke;
                EngineOutput::redraw()
            }
            ToolKind::Connector => {
                self.connector.cancel();
                self.connector_tool.handle(ToolPhase::Down, world, &self.session);
                self.gesture = Gesture::Connector;
                EngineOutput::redraw()
            }
            ToolKind::Select | ToolKind::Connect | ToolKind::Hand => {
                self.press(diagram, client, world, modifiers)
            }
        };
        out.proposals.extend(next.proposals);
        out.redraw |= next.redraw;
        out
    }

    fn press(&mut self, diagram: &Diagram, client: Position, world: Position, modifiers: Modifiers) -> EngineOutput {
        let routes = route_all(diagram, &self.session.route);
        let hit = hit_test(
            diagram,
            &routes,
            self.selection.edge(),
            world,
            self.viewport.zoom(),
            &self.session.hit,
        );
        log::debug!("press {hit:?} with {:?}", self.session.tool);
        let connect_tool = self.session.tool == ToolKind::Connect;

        match hit {
            Hit::EdgeHandle(edge, end) => {
                self.connector.begin_reconnect(edge, end, world);
                self.gesture = Gesture::Connecting;
            }
            Hit::Port(node, port) => {
                self.gesture = Gesture::PortPress {
                    node,
                    port,
                    down_client: client,
                };
            }
            Hit::Node(node) if connect_tool => {
                let port = diagram
                    .node(node)
                    .map(|n| closest_port(n, world))
                    .unwrap_or_default();
                return self.connect_click(Some((node, port)), world);
            }
            Hit::Node(node) => {
                let collapse = if modifiers.shift {
                    self.selection.toggle_node(node);
                    if !self.selection.contains(node) {
                        return EngineOutput::redraw();
                    }
                    false
                } else if self.selection.contains(node) && self.selection.node_count() > 1 {
                    true
                } else {
                    self.selection.select_nodes([node]);
                    false
                };
                self.gesture = Gesture::Press {
                    node,
                    down_client: client,
                    down_world: world,
                    collapse,
                };
            }
            Hit::Edge(edge) => {
                if connect_tool {
                    self.connector.cancel();
                }
                self.selection.select_edge(Some(edge));
            }
            Hit::Background if connect_tool => return self.connect_click(None, world),
            Hit::Background => {
                if !modifiers.shift {
                    self.selection.clear();
                }
                self.connector.cancel();
                self.gesture = Gesture::Marquee(Marquee::begin(world, &self.selection, modifiers.shift));
            }
        }
        EngineOutput::redraw()
    }

    fn connect_click(&mut self, target: Option<(NodeId, Port)>, world: Position) -> EngineOutput {
        match self.connector.click(target, world, &self.session.edge_defaults) {
            ConnectStep::Commit { mutation, select } => {
                self.selection.select_edge(Some(select));
                EngineOutput::with(Proposal::push(vec![mutation]))
            }
            ConnectStep::Started | ConnectStep::Cancelled => EngineOutput::redraw(),
            ConnectStep::Nothing => EngineOutput::default(),
        }
    }

    fn pointer_move(&mut self, diagram: &Diagram, client: Position, modifiers: Modifiers) -> EngineOutput {
        let world = self.viewport.to_world(client.x, client.y);
        match std::mem::take(&mut self.gesture) {
            Gesture::None => {
                if self.connector.pointer_move(world) {
                    return EngineOutput::redraw();
                }
                EngineOutput::default()
            }
            Gesture::Press {
                node,
                down_client,
                down_world,
                collapse,
            } => {
                if !past_threshold(client, down_client) {
                    self.gesture = Gesture::Press {
                        node,
                        down_client,
                        down_world,
                        collapse,
                    };
                    return EngineOutput::default();
                }
                let ids = self.selection.node_ids();
                match DragState::begin(diagram, &ids, down_world) {
                    Some(drag) => {
                        self.connector.cancel();
                        self.drag_to(diagram, &drag, world, modifiers.alt);
                        self.gesture = Gesture::Drag(drag);
                    }
                    None => log::warn!("drag start without any live selected node"),
                }
                EngineOutput::redraw()
            }
            Gesture::Drag(drag) => {
                self.drag_to(diagram, &drag, world, modifiers.alt);
                self.gesture = Gesture::Drag(drag);
                EngineOutput::redraw()
            }
            Gesture::Marquee(mut marquee) => {
                marquee.update(world, diagram, &mut self.selection);
                self.gesture = Gesture::Marquee(marquee);
                EngineOutput::redraw()
            }
            Gesture::Pan => {
                self.viewport.update_pan(client);
                self.gesture = Gesture::Pan;
                EngineOutput::redraw()
            }
            Gesture::PortPress {
                node,
                port,
                down_client,
            } => {
                if past_threshold(client, down_client) {
                    self.connector.begin_direct(node, port, world);
                    self.gesture = Gesture::Connecting;
                    return EngineOutput::redraw();
                }
                self.gesture = Gesture::PortPress {
                    node,
                    port,
                    down_client,
                };
                EngineOutput::default()
            }
            Gesture::Connecting => {
                self.connector.pointer_move(world);
                self.gesture = Gesture::Connecting;
                EngineOutput::redraw()
            }
            Gesture::Stroke => {
                self.pen.handle(ToolPhase::Move, world, &self.session);
                self.gesture = Gesture::Stroke;
                EngineOutput::redraw()
            }
            Gesture::Connector => {
                self.connector_tool.handle(ToolPhase::Move, world, &self.session);
                self.gesture = Gesture::Connector;
                EngineOutput::redraw()
            }
        }
    }

    /// Queue positions for the current pointer. Moves that would put a
    /// node back where the document already has it are dropped, so a
    /// non-empty flush always changes the diagram.
    fn drag_to(&mut self, diagram: &Diagram, drag: &DragState, world: Position, alt: bool) {
        let (moves, guide) = drag.update(world, &self.session.grid, &self.session.lanes, alt);
        for m in moves {
            let unchanged = diagram.node(m.id).is_some_and(|n| {
                n.position == m.position && (m.swimlane.is_none() || m.swimlane == n.swimlane_id)
            });
            if unchanged {
                self.coalescer.discard(m.id);
            } else {
                self.coalescer.queue(m.id, m.position, m.swimlane);
            }
        }
        self.snap_guide = guide;
    }

    fn pointer_up(&mut self, diagram: &Diagram, client: Position) -> EngineOutput {
        let world = self.viewport.to_world(client.x, client.y);
        match std::mem::take(&mut self.gesture) {
            Gesture::None => EngineOutput::default(),
            Gesture::Press { node, collapse, .. } => {
                if collapse {
                    self.selection.select_nodes([node]);
                }
                EngineOutput::redraw()
            }
            Gesture::Drag(mut drag) => {
                self.snap_guide = None;
                let mut out = EngineOutput::redraw();
                out.push(drain(&mut self.coalescer, &mut drag, self.windows.drag_ms));
                log::debug!("drag end");
                out
            }
            Gesture::Marquee(_) => EngineOutput::redraw(),
            Gesture::Pan => {
                self.viewport.end_pan();
                EngineOutput::redraw()
            }
            Gesture::PortPress { node, port, .. } => {
                if self.session.tool == ToolKind::Connect {
                    self.connect_click(Some((node, port)), world)
                } else {
                    self.selection.select_nodes([node]);
                    EngineOutput::redraw()
                }
            }
            Gesture::Connecting => {
                let radius = self.session.hit.port_radius / self.viewport.zoom();
                let port = hit_test_port(diagram, world, radius);
                let node = hit_test_node(diagram, world);
                match self
                    .connector
                    .release(diagram, port, node, world, &self.session.edge_defaults)
                {
                    ConnectStep::Commit { mutation, select } => {
                        self.selection.select_edge(Some(select));
                        EngineOutput::with(Proposal::push(vec![mutation]))
                    }
                    _ => EngineOutput::redraw(),
                }
            }
            Gesture::Stroke => {
                let mutations = self.pen.handle(ToolPhase::Up, world, &self.session);
                if mutations.is_empty() {
                    return EngineOutput::redraw();
                }
                EngineOutput::with(Proposal::push(mutations))
            }
            Gesture::Connector => {
                let mutations = self.connector_tool.handle(ToolPhase::Up, world, &self.session);
                let created = mutations.iter().find_map(|m| match m {
                    GraphMutation::AddEdge { edge } => Some(edge.id),
                    _ => None,
                });
                let Some(edge) = created else {
                    return EngineOutput::redraw();
                };
                self.selection.select_edge(Some(edge));
                self.session.tool = ToolKind::Select;
                EngineOutput::with(Proposal::push(mutations))
            }
        }
    }
}
