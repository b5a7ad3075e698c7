//! Edge routing: diagram edges → kurbo paths.
//!
//! Each edge gets a path between its two port positions, a label anchor at
//! the path midpoint, and the tangent angles the painter needs for the
//! arrowheads. Parallel edges joining the same node pair fan out around the
//! straight connection so none of them overlap.

use fof_core::geometry::{node_center, port_position};
use fof_core::id::{EdgeId, NodeId};
use fof_core::model::{Diagram, Edge, Node, PathType, Port, Position};
use kurbo::{BezPath, CubicBez, ParamCurve, ParamCurveDeriv, Point, Vec2};
use std::collections::HashMap;

/// Spacing between neighbouring parallel edges, in world units.
pub const DEFAULT_FAN_GAP: f32 = 28.0;

/// Shortest distance a bezier control point sits from its port.
const MIN_CONTROL_DISTANCE: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteConfig {
    pub fan_gap: f32,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            fan_gap: DEFAULT_FAN_GAP,
        }
    }
}

/// Geometry of one routed edge, in world space.
#[derive(Debug, Clone)]
pub struct EdgeRoute {
    pub edge: EdgeId,
    pub path: BezPath,
    pub start: Point,
    pub end: Point,
    /// Where the label / sequence glyph is centered.
    pub label_pos: Point,
    /// Direction of travel at `end`, radians.
    pub end_angle: f64,
    /// Direction of travel at `label_pos`, radians.
    pub mid_angle: f64,
    /// Fan-out offset applied to this edge.
    pub offset: f32,
}

pub fn to_point(p: Position) -> Point {
    Point::new(p.x as f64, p.y as f64)
}

pub fn to_position(p: Point) -> Position {
    Position::new(p.x as f32, p.y as f32)
}

fn unit(v: Vec2) -> Option<Vec2> {
    let len = v.hypot();
    (len > f64::EPSILON).then(|| v / len)
}

fn normal_vec(port: Port) -> Vec2 {
    let (x, y) = port.normal();
    Vec2::new(x as f64, y as f64)
}

// ─── Fan-out ─────────────────────────────────────────────────────────────

/// Unordered pair key with a stable orientation (lower id string first).
fn canonical_pair(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a.as_str() <= b.as_str() { (a, b) } else { (b, a) }
}

/// Per-edge fan-out offsets.
///
/// Edges are grouped by unordered node pair, indexed in document order, and
/// spread symmetrically: `index * gap - (count - 1) * gap / 2`. An explicit
/// `curvature` on the edge wins over the computed offset.
pub fn fan_offsets(edges: &[Edge], gap: f32) -> HashMap<EdgeId, f32> {
    let mut groups: HashMap<(NodeId, NodeId), Vec<&Edge>> = HashMap::new();
    for edge in edges {
        groups
            .entry(canonical_pair(edge.source_id, edge.target_id))
            .or_default()
            .push(edge);
    }

    let mut offsets = HashMap::with_capacity(edges.len());
    for group in groups.values() {
        let count = group.len() as f32;
        for (index, edge) in group.iter().enumerate() {
            let computed = index as f32 * gap - (count - 1.0) * gap / 2.0;
            offsets.insert(edge.id, edge.curvature.unwrap_or(computed));
        }
    }
    offsets
}

/// Unit perpendicular of the canonical pair direction. Both edges of an
/// A→B / B→A pair share it, so opposite offsets stay on opposite sides.
fn pair_perpendicular(diagram: &Diagram, edge: &Edge) -> Vec2 {
    let (lo, hi) = canonical_pair(edge.source_id, edge.target_id);
    let centers = diagram
        .node(lo)
        .zip(diagram.node(hi))
        .map(|(a, b)| to_point(node_center(b)) - to_point(node_center(a)));
    match centers.and_then(unit) {
        Some(dir) => Vec2::new(-dir.y, dir.x),
        None => Vec2::new(0.0, 1.0),
    }
}

// ─── Path builders ───────────────────────────────────────────────────────

/// Route a single edge. `None` when either endpoint is missing.
pub fn route_edge(diagram: &Diagram, edge: &Edge, offset: f32) -> Option<EdgeRoute> {
    let source = diagram.node(edge.source_id)?;
    let target = diagram.node(edge.target_id)?;

    let shift = pair_perpendicular(diagram, edge) * (offset as f64 / 2.0);
    let start = to_point(port_position(source, edge.source_port)) + shift;
    let end = to_point(port_position(target, edge.target_port)) + shift;

    let route = match edge.path_type {
        PathType::Bezier => bezier_route(source, edge.source_port, start, target, edge.target_port, end),
        PathType::Orthogonal => orthogonal_route(start, end, offset as f64 / 2.0),
    };
    log::trace!(
        "route {} {:?} offset {offset} ({:.1},{:.1}) -> ({:.1},{:.1})",
        edge.id,
        edge.path_type,
        start.x,
        start.y,
        end.x,
        end.y
    );
    Some(EdgeRoute {
        edge: edge.id,
        path: route.path,
        start,
        end,
        label_pos: route.mid,
        end_angle: route.end_tangent.atan2(),
        mid_angle: route.mid_tangent.atan2(),
        offset,
    })
}

/// Route every edge in document order, skipping dangling ones.
pub fn route_all(diagram: &Diagram, config: &RouteConfig) -> Vec<EdgeRoute> {
    let offsets = fan_offsets(&diagram.edges, config.fan_gap);
    diagram
        .edges
        .iter()
        .filter_map(|e| {
            let offset = offsets.get(&e.id).copied().unwrap_or(0.0);
            route_edge(diagram, e, offset)
        })
        .collect()
}

struct Shape {
    path: BezPath,
    mid: Point,
    mid_tangent: Vec2,
    end_tangent: Vec2,
}

/// Direction a bezier leaves (or enters) `node`. Anchors have no side, so
/// they aim at the opposite end.
fn exit_direction(node: &Node, port: Port, from: Point, toward: Point) -> Vec2 {
    if node.is_connector_handle {
        unit(toward - from).unwrap_or(Vec2::new(1.0, 0.0))
    } else {
        normal_vec(port)
    }
}

fn bezier_route(
    source: &Node,
    source_port: Port,
    start: Point,
    target: &Node,
    target_port: Port,
    end: Point,
) -> Shape {
    let reach = ((end - start).hypot() * 0.4).max(MIN_CONTROL_DISTANCE);
    let c1 = start + exit_direction(source, source_port, start, end) * reach;
    let c2 = end + exit_direction(target, target_port, end, start) * reach;

    let cubic = CubicBez::new(start, c1, c2, end);
    let mid = cubic.eval(0.5);
    let mid_tangent = cubic.deriv().eval(0.5).to_vec2();
    let end_tangent = unit(end - c2)
        .or_else(|| unit(end - c1))
        .unwrap_or(end - start);

    let mut path = BezPath::new();
    path.move_to(start);
    path.curve_to(c1, c2, end);
    Shape {
        path,
        mid,
        mid_tangent,
        end_tangent,
    }
}

/// Single-elbow route. Horizontal runs dominate → H-V-H through mid x,
/// otherwise V-H-V through mid y. `bias` nudges the elbow so parallel
/// orthogonal edges do not share the middle segment.
fn orthogonal_route(start: Point, end: Point, bias: f64) -> Shape {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let (a, b) = if dx.abs() >= dy.abs() {
        let mid_x = (start.x + end.x) / 2.0 + bias;
        (Point::new(mid_x, start.y), Point::new(mid_x, end.y))
    } else {
        let mid_y = (start.y + end.y) / 2.0 + bias;
        (Point::new(start.x, mid_y), Point::new(end.x, mid_y))
    };

    let mut path = BezPath::new();
    path.move_to(start);
    path.line_to(a);
    path.line_to(b);
    path.line_to(end);

    let mid_tangent = unit(b - a).unwrap_or(end - start);
    let end_tangent = unit(end - b).or_else(|| unit(b - a)).unwrap_or(end - start);
    Shape {
        path,
        mid: a.midpoint(b),
        mid_tangent,
        end_tangent,
    }
}

/// Quadratic preview from a pending connection's source port to the
/// pointer, bowed perpendicular to the straight line.
pub fn preview_path(from: Point, pointer: Point) -> BezPath {
    let span = pointer - from;
    let bow = (span.hypot() * 0.2).min(80.0);
    let perp = unit(Vec2::new(-span.y, span.x)).unwrap_or(Vec2::ZERO);
    let control = from.midpoint(pointer) + perp * bow;

    let mut path = BezPath::new();
    path.move_to(from);
    path.quad_to(control, pointer);
    path
}

/// Triangle for an arrowhead whose tip is at `tip`, pointing along `angle`.
pub fn arrow_head(tip: Point, angle: f64, size: f64) -> [Point; 3] {
    let spread = std::f64::consts::FRAC_PI_6;
    let back = |a: f64| tip - Vec2::new(a.cos(), a.sin()) * size;
    [tip, back(angle - spread), back(angle + spread)]
}
