//! Hit testing: world point → what is under the pointer.
//!
//! Nodes are walked front-to-back (highest z-index first, later document
//! order winning ties) so the topmost box wins. Tolerances are given in
//! screen pixels and divided by the zoom so they feel constant on screen.

use crate::route::{EdgeRoute, to_point};
use fof_core::geometry::{node_bounds, port_position, squared_distance};
use fof_core::id::{EdgeId, NodeId};
use fof_core::model::{Bounds, Diagram, EdgeEnd, Port, Position};
use kurbo::{ParamCurveNearest, Point};

/// Screen-pixel tolerances for each kind of target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitConfig {
    pub port_radius: f32,
    pub handle_radius: f32,
    pub edge_tolerance: f32,
}

impl Default for HitConfig {
    fn default() -> Self {
        Self {
            port_radius: 7.0,
            handle_radius: 8.0,
            edge_tolerance: 6.0,
        }
    }
}

/// Result of a prioritized hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    /// Endpoint handle of the currently selected edge.
    EdgeHandle(EdgeId, EdgeEnd),
    Port(NodeId, Port),
    Node(NodeId),
    Edge(EdgeId),
    Background,
}

/// Topmost node whose box contains `world`.
pub fn hit_test_node(diagram: &Diagram, world: Position) -> Option<NodeId> {
    diagram
        .nodes_by_z()
        .into_iter()
        .rev()
        .find(|n| node_bounds(n).contains(world.x, world.y))
        .map(|n| n.id)
}

/// Port within `radius` (world units) of `world`, on the topmost node that
/// has one. Connector anchors expose no ports.
pub fn hit_test_port(diagram: &Diagram, world: Position, radius: f32) -> Option<(NodeId, Port)> {
    let r2 = radius * radius;
    diagram
        .nodes_by_z()
        .into_iter()
        .rev()
        .filter(|n| !n.is_connector_handle)
        .find_map(|n| {
            Port::ALL
                .iter()
                .map(|&p| (p, squared_distance(port_position(n, p), world)))
                .filter(|&(_, d)| d <= r2)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(p, _)| (n.id, p))
        })
}

/// Closest routed edge within `tolerance` (world units) of `world`.
pub fn hit_test_edge(routes: &[EdgeRoute], world: Position, tolerance: f32) -> Option<EdgeId> {
    let p = to_point(world);
    let limit = (tolerance as f64) * (tolerance as f64);
    let mut best: Option<(EdgeId, f64)> = None;
    // Later edges paint on top, so they win exact ties.
    for route in routes.iter().rev() {
        let d2 = route
            .path
            .segments()
            .map(|seg| seg.nearest(p, 1e-3).distance_sq)
            .fold(f64::INFINITY, f64::min);
        if d2 <= limit && best.is_none_or(|(_, b)| d2 < b) {
            best = Some((route.edge, d2));
        }
    }
    log::trace!("edge hit at ({}, {}): {:?}", world.x, world.y, best);
    best.map(|(id, _)| id)
}

/// Which endpoint handle of `route` lies within `radius` of `world`.
/// The target handle wins when both overlap.
pub fn hit_test_edge_handle(route: &EdgeRoute, world: Position, radius: f32) -> Option<EdgeEnd> {
    let p = to_point(world);
    let r = radius as f64;
    let near = |q: Point| (q - p).hypot2() <= r * r;
    if near(route.end) {
        Some(EdgeEnd::Target)
    } else if near(route.start) {
        Some(EdgeEnd::Source)
    } else {
        None
    }
}

/// Every node whose box overlaps `rect`, touching included, in document
/// order. Used for marquee selection.
pub fn hit_test_rect(diagram: &Diagram, rect: &Bounds) -> Vec<NodeId> {
    diagram
        .nodes
        .iter()
        .filter(|n| node_bounds(n).intersects(rect))
        .map(|n| n.id)
        .collect()
}

/// Full hit test with the canvas priority order: selected-edge handles,
/// ports, nodes, edges, background.
pub fn hit_test(
    diagram: &Diagram,
    routes: &[EdgeRoute],
    selected_edge: Option<EdgeId>,
    world: Position,
    zoom: f32,
    config: &HitConfig,
) -> Hit {
    let scale = 1.0 / zoom.max(f32::EPSILON);

    if let Some(edge) = selected_edge
        && let Some(route) = routes.iter().find(|r| r.edge == edge)
        && let Some(end) = hit_test_edge_handle(route, world, config.handle_radius * scale)
    {
        return Hit::EdgeHandle(edge, end);
    }
    if let Some((node, port)) = hit_test_port(diagram, world, config.port_radius * scale) {
        return Hit::Port(node, port);
    }
    if let Some(node) = hit_test_node(diagram, world) {
        return Hit::Node(node);
    }
    if let Some(edge) = hit_test_edge(routes, world, config.edge_tolerance * scale) {
        return Hit::Edge(edge);
    }
    Hit::Background
}
