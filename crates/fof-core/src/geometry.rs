//! Pure node geometry: dimensions, bounding boxes and port positions.
//!
//! Everything here is a function of a single `Node` value; nothing reads
//! the rest of the diagram.

use crate::model::{Bounds, Node, NodeShape, Port, Position, Size};

/// Side length of a connector-handle anchor.
pub const ANCHOR_SIZE: f32 = 16.0;

/// Default box for a shape when the node carries no explicit size.
pub fn default_size(shape: NodeShape, is_anchor: bool) -> Size {
    if is_anchor {
        return Size {
            width: ANCHOR_SIZE,
            height: ANCHOR_SIZE,
        };
    }
    let (width, height) = match shape {
        NodeShape::Rectangle | NodeShape::RoundedRect => (180.0, 60.0),
        NodeShape::Circle => (80.0, 80.0),
        NodeShape::Diamond => (100.0, 100.0),
        NodeShape::Hexagon => (160.0, 70.0),
        NodeShape::Cylinder => (120.0, 80.0),
    };
    Size { width, height }
}

/// Effective size of a node. Anchors are always `ANCHOR_SIZE` square;
/// other nodes use their explicit width/height, falling back per axis.
pub fn node_dimensions(node: &Node) -> Size {
    let fallback = default_size(node.shape, node.is_connector_handle);
    if node.is_connector_handle {
        return fallback;
    }
    Size {
        width: node.width.unwrap_or(fallback.width),
        height: node.height.unwrap_or(fallback.height),
    }
}

pub fn node_bounds(node: &Node) -> Bounds {
    let size = node_dimensions(node);
    Bounds {
        x: node.position.x,
        y: node.position.y,
        width: size.width,
        height: size.height,
    }
}

pub fn node_center(node: &Node) -> Position {
    node_bounds(node).center()
}

/// World position of a port. Anchors have a single logical point (their
/// center) whatever the requested port.
pub fn port_position(node: &Node, port: Port) -> Position {
    let b = node_bounds(node);
    if node.is_connector_handle {
        return b.center();
    }
    match port {
        Port::Top => Position::new(b.x + b.width / 2.0, b.y),
        Port::Right => Position::new(b.x + b.width, b.y + b.height / 2.0),
        Port::Bottom => Position::new(b.x + b.width / 2.0, b.y + b.height),
        Port::Left => Position::new(b.x, b.y + b.height / 2.0),
    }
}

pub fn squared_distance(a: Position, b: Position) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Port nearest to `point`. Ties resolve to the lowest port index.
pub fn closest_port(node: &Node, point: Position) -> Port {
    let mut best = Port::Top;
    let mut best_d = f32::INFINITY;
    for port in Port::ALL {
        let d = squared_distance(port_position(node, port), point);
        if d < best_d {
            best = port;
            best_d = d;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use crate::model::EntityKind;

    fn rect_at(x: f32, y: f32) -> Node {
        Node::new(NodeId::intern("g_rect"), EntityKind::Processor, "P", Position::new(x, y))
    }

    #[test]
    fn default_dimensions_by_shape() {
        let n = rect_at(0.0, 0.0);
        assert_eq!(node_dimensions(&n), Size { width: 180.0, height: 60.0 });
        let c = rect_at(0.0, 0.0).with_shape(NodeShape::Circle);
        assert_eq!(node_dimensions(&c), Size { width: 80.0, height: 80.0 });
        let d = rect_at(0.0, 0.0).with_shape(NodeShape::Diamond);
        assert_eq!(node_dimensions(&d), Size { width: 100.0, height: 100.0 });
    }

    #[test]
    fn explicit_size_overrides_per_axis() {
        let mut n = rect_at(0.0, 0.0);
        n.width = Some(240.0);
        assert_eq!(node_dimensions(&n), Size { width: 240.0, height: 60.0 });
    }

    #[test]
    fn anchors_ignore_explicit_size() {
        let mut a = Node::anchor(NodeId::intern("g_anchor"), Position::new(50.0, 50.0));
        a.width = Some(500.0);
        assert_eq!(node_dimensions(&a), Size { width: 16.0, height: 16.0 });
        for port in Port::ALL {
            assert_eq!(port_position(&a, port), Position::new(50.0, 50.0));
        }
    }

    #[test]
    fn port_positions_are_side_midpoints() {
        let n = rect_at(100.0, 200.0);
        assert_eq!(port_position(&n, Port::Top), Position::new(190.0, 200.0));
        assert_eq!(port_position(&n, Port::Right), Position::new(280.0, 230.0));
        assert_eq!(port_position(&n, Port::Bottom), Position::new(190.0, 260.0));
        assert_eq!(port_position(&n, Port::Left), Position::new(100.0, 230.0));
        assert_eq!(node_center(&n), Position::new(190.0, 230.0));
    }

    #[test]
    fn closest_port_picks_nearest_side() {
        let n = rect_at(0.0, 0.0);
        assert_eq!(closest_port(&n, Position::new(400.0, 30.0)), Port::Right);
        assert_eq!(closest_port(&n, Position::new(-50.0, 35.0)), Port::Left);
        assert_eq!(closest_port(&n, Position::new(90.0, -20.0)), Port::Top);
        assert_eq!(closest_port(&n, Position::new(90.0, 500.0)), Port::Bottom);
    }

    #[test]
    fn closest_port_tie_prefers_lowest_index() {
        // Center of a square is equidistant from all four ports.
        let n = rect_at(0.0, 0.0).with_shape(NodeShape::Circle);
        assert_eq!(closest_port(&n, node_center(&n)), Port::Top);
    }

    #[test]
    fn squared_distance_basics() {
        assert_eq!(squared_distance(Position::new(0.0, 0.0), Position::new(3.0, 4.0)), 25.0);
    }
}
