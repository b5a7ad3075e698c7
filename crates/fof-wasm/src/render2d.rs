//! Canvas2D renderer.
//!
//! Draws the editor's diagram and live gesture feedback to an HTML
//! `<canvas>` through `CanvasRenderingContext2d`. World-space drawing runs
//! under the viewport transform; line widths are divided by the zoom so
//! strokes keep a constant screen thickness.

use fof_core::geometry::{node_bounds, port_position};
use fof_core::layout::{LaneConfig, LaneGrouping};
use fof_core::model::*;
use fof_editor::{ConnectionState, Editor, ToolKind};
use fof_render::route::{EdgeRoute, arrow_head, preview_path, route_all, to_point};
use kurbo::{BezPath, PathEl, PathSeg, Point};
use std::f64::consts::{PI, TAU};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

/// Fixed colors used by the renderer.
pub struct CanvasPalette {
    pub bg: &'static str,
    pub grid: &'static str,
    pub lane_band: &'static str,
    pub lane_label: &'static str,
    pub node_stroke: &'static str,
    pub node_text: &'static str,
    pub node_subtext: &'static str,
    pub selection: &'static str,
    pub handle_fill: &'static str,
    pub exception: &'static str,
    pub guide: &'static str,
}

impl Default for CanvasPalette {
    fn default() -> Self {
        Self {
            bg: "#F8FAFC",
            grid: "rgba(15, 23, 42, 0.06)",
            lane_band: "rgba(15, 23, 42, 0.025)",
            lane_label: "#94A3B8",
            node_stroke: "#334155",
            node_text: "#0F172A",
            node_subtext: "#475569",
            selection: "#2563EB",
            handle_fill: "#FFFFFF",
            exception: "#DC2626",
            guide: "#F472B6",
        }
    }
}

/// Stroke color of a payment rail.
pub fn rail_color(rail: PaymentRail) -> &'static str {
    match rail {
        PaymentRail::Blank => "#64748B",
        PaymentRail::Ach => "#2563EB",
        PaymentRail::Wire => "#7C3AED",
        PaymentRail::Rtp => "#059669",
        PaymentRail::FedNow => "#0D9488",
        PaymentRail::Card => "#EA580C",
        PaymentRail::Swift => "#4F46E5",
        PaymentRail::Sepa => "#0284C7",
        PaymentRail::Check => "#A16207",
        PaymentRail::Crypto => "#CA8A04",
        PaymentRail::BookTransfer => "#475569",
        PaymentRail::Internal => "#94A3B8",
    }
}

/// Default fill of an entity when the node has no explicit color.
pub fn kind_fill(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Bank | EntityKind::SponsorBank | EntityKind::CentralBank => "#DBEAFE",
        EntityKind::Processor | EntityKind::Gateway => "#EDE9FE",
        EntityKind::CardNetwork | EntityKind::Acquirer | EntityKind::Issuer => "#FFEDD5",
        EntityKind::Merchant | EntityKind::Customer | EntityKind::Business => "#DCFCE7",
        EntityKind::Fintech | EntityKind::ProgramManager | EntityKind::Wallet => "#CCFBF1",
        EntityKind::Ledger | EntityKind::Custodian => "#FEF9C3",
        EntityKind::Other => "#F1F5F9",
    }
}

/// Text under an edge: its label and, when set, the amount.
pub fn edge_caption(edge: &Edge) -> Option<String> {
    let amount = edge.amount.map(|a| match edge.currency.as_deref() {
        Some(cur) if !cur.is_empty() => format!("{cur} {a:.2}"),
        _ => format!("{a:.2}"),
    });
    match (edge.label.trim(), amount) {
        ("", None) => None,
        ("", Some(a)) => Some(a),
        (label, None) => Some(label.to_string()),
        (label, Some(a)) => Some(format!("{label} · {a}")),
    }
}

/// World-space rectangle visible on a `width × height` canvas.
pub fn visible_world(transform: &fof_core::viewport::ViewportTransform, width: f64, height: f64) -> Bounds {
    let zoom = transform.zoom.max(f32::EPSILON);
    Bounds {
        x: -transform.x / zoom,
        y: -transform.y / zoom,
        width: width as f32 / zoom,
        height: height as f32 / zoom,
    }
}

/// Render the whole canvas.
pub fn render_scene(
    ctx: &CanvasRenderingContext2d,
    editor: &Editor,
    canvas_width: f64,
    canvas_height: f64,
    palette: &CanvasPalette,
) {
    let diagram = editor.diagram();
    let engine = editor.engine();
    let session = editor.session();
    let transform = editor.viewport().transform();
    let zoom = transform.zoom as f64;
    let view = visible_world(&transform, canvas_width, canvas_height);

    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_fill_style_str(palette.bg);
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);

    ctx.save();
    let _ = ctx.set_transform(zoom, 0.0, 0.0, zoom, transform.x as f64, transform.y as f64);

    if session.lanes.grouping == LaneGrouping::Manual {
        draw_lanes(ctx, &session.lanes, &view, zoom, palette);
    }
    if session.grid.visible {
        draw_grid(ctx, session.grid.size, &view, zoom, palette);
    }
    for drawing in &diagram.drawings {
        draw_stroke(ctx, &drawing.points, &drawing.color, drawing.width as f64);
    }

    let routes = route_all(diagram, &session.route);
    let hidden = engine.reconnecting();
    let selected_edge = editor.selection().edge();
    for route in &routes {
        if Some(route.edge) == hidden {
            continue;
        }
        let Some(edge) = diagram.edge(route.edge) else {
            continue;
        };
        let selected = Some(edge.id) == selected_edge;
        draw_edge(ctx, edge, route, selected, zoom, palette);
    }

    for node in diagram.nodes_by_z() {
        draw_node(ctx, node, zoom, palette);
    }

    // Overlays
    for id in editor.selection().nodes() {
        if let Some(node) = diagram.node(id) {
            draw_node_selection(ctx, node, zoom, palette);
        }
    }
    let show_ports = session.tool == ToolKind::Connect || !matches!(engine.connection(), ConnectionState::Idle);
    if show_ports {
        for node in diagram.nodes.iter().filter(|n| !n.is_connector_handle) {
            draw_ports(ctx, node, zoom, palette);
        }
    }
    if let Some(route) = selected_edge.and_then(|id| routes.iter().find(|r| r.edge == id))
        && hidden.is_none()
    {
        let radius = session.hit.handle_radius as f64 / zoom;
        draw_handle(ctx, route.start, radius, zoom, palette);
        draw_handle(ctx, route.end, radius, zoom, palette);
    }
    if let Some((from, pointer)) = engine.connection_preview(diagram) {
        let path = preview_path(to_point(from), to_point(pointer));
        ctx.save();
        ctx.set_stroke_style_str(palette.selection);
        ctx.set_line_width(2.0 / zoom);
        set_dash(ctx, &[6.0 / zoom, 4.0 / zoom]);
        trace_path(ctx, &path);
        ctx.stroke();
        ctx.restore();
    }

    let pen = engine.pen_points();
    if pen.len() > 1 {
        draw_stroke(ctx, pen, &session.pen.color, session.pen.width as f64);
    }
    if let Some((a, b)) = engine.connector_segment() {
        ctx.save();
        ctx.set_stroke_style_str(rail_color(PaymentRail::Blank));
        ctx.set_line_width(2.0 / zoom);
        set_dash(ctx, &[4.0 / zoom, 4.0 / zoom]);
        ctx.begin_path();
        ctx.move_to(a.x as f64, a.y as f64);
        ctx.line_to(b.x as f64, b.y as f64);
        ctx.stroke();
        ctx.restore();
    }

    if let Some(guide) = engine.snap_guide() {
        draw_snap_guide(ctx, guide.x as f64, guide.y as f64, &view, zoom, palette);
    }
    if let Some(rect) = engine.marquee_rect() {
        draw_marquee_rect(ctx, &rect, zoom, palette);
    }

    ctx.restore();
}

// ─── Background ──────────────────────────────────────────────────────────

fn draw_grid(ctx: &CanvasRenderingContext2d, size: f32, view: &Bounds, zoom: f64, palette: &CanvasPalette) {
    // Too dense to be useful when zoomed far out.
    if size <= 0.0 || (size as f64) * zoom < 8.0 {
        return;
    }
    let size = size as f64;
    let (x0, y0) = (view.x as f64, view.y as f64);
    let (x1, y1) = (x0 + view.width as f64, y0 + view.height as f64);

    ctx.save();
    ctx.set_stroke_style_str(palette.grid);
    ctx.set_line_width(1.0 / zoom);
    ctx.begin_path();
    let mut x = (x0 / size).floor() * size;
    while x <= x1 {
        ctx.move_to(x, y0);
        ctx.line_to(x, y1);
        x += size;
    }
    let mut y = (y0 / size).floor() * size;
    while y <= y1 {
        ctx.move_to(x0, y);
        ctx.line_to(x1, y);
        y += size;
    }
    ctx.stroke();
    ctx.restore();
}

fn draw_lanes(ctx: &CanvasRenderingContext2d, lanes: &LaneConfig, view: &Bounds, zoom: f64, palette: &CanvasPalette) {
    let h = lanes.effective_height() as f64;
    let first = lanes.lane_for_y(view.y);
    let last = lanes.lane_for_y(view.y + view.height);

    ctx.save();
    ctx.set_font(&format!("{}px Inter, system-ui, sans-serif", 12.0 / zoom));
    ctx.set_text_baseline("top");
    ctx.set_text_align("left");
    for lane in first..=last {
        let top = (lane - 1) as f64 * h;
        if lane % 2 == 0 {
            ctx.set_fill_style_str(palette.lane_band);
            ctx.fill_rect(view.x as f64, top, view.width as f64, h);
        }
        let label = lanes
            .lanes
            .iter()
            .find(|l| l.id == lane)
            .map(|l| l.label.clone())
            .unwrap_or_else(|| format!("Lane {lane}"));
        ctx.set_fill_style_str(palette.lane_label);
        let _ = ctx.fill_text(&label, view.x as f64 + 8.0 / zoom, top + 6.0 / zoom);
    }
    ctx.restore();
}

// ─── Nodes ───────────────────────────────────────────────────────────────

fn draw_node(ctx: &CanvasRenderingContext2d, node: &Node, zoom: f64, palette: &CanvasPalette) {
    let b = node_bounds(node);
    let (x, y, w, h) = (b.x as f64, b.y as f64, b.width as f64, b.height as f64);

    if node.is_connector_handle {
        ctx.save();
        ctx.set_fill_style_str(rail_color(PaymentRail::Blank));
        ctx.begin_path();
        let _ = ctx.arc(x + w / 2.0, y + h / 2.0, w / 4.0, 0.0, TAU);
        ctx.fill();
        ctx.restore();
        return;
    }

    ctx.save();
    ctx.set_fill_style_str(node.color.as_deref().unwrap_or(kind_fill(node.kind)));
    ctx.set_stroke_style_str(palette.node_stroke);
    ctx.set_line_width(1.5 / zoom);
    shape_path(ctx, node.shape, x, y, w, h);
    ctx.fill();
    ctx.stroke();
    if node.shape == NodeShape::Cylinder {
        // Front rim of the top cap.
        let ry = cylinder_cap(h);
        ctx.begin_path();
        let _ = ctx.ellipse(x + w / 2.0, y + ry, w / 2.0, ry, 0.0, 0.0, PI);
        ctx.stroke();
    }

    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let cx = x + w / 2.0;
    let cy = y + h / 2.0;
    match node.account_type.as_deref().filter(|s| !s.is_empty()) {
        Some(account) => {
            ctx.set_font("600 13px Inter, system-ui, sans-serif");
            ctx.set_fill_style_str(palette.node_text);
            let _ = ctx.fill_text(&node.label, cx, cy - 8.0);
            ctx.set_font("11px Inter, system-ui, sans-serif");
            ctx.set_fill_style_str(palette.node_subtext);
            let _ = ctx.fill_text(account, cx, cy + 9.0);
        }
        None => {
            ctx.set_font("600 13px Inter, system-ui, sans-serif");
            ctx.set_fill_style_str(palette.node_text);
            let _ = ctx.fill_text(&node.label, cx, cy);
        }
    }
    ctx.restore();
}

fn cylinder_cap(h: f64) -> f64 {
    (h * 0.15).min(12.0)
}

fn shape_path(ctx: &CanvasRenderingContext2d, shape: NodeShape, x: f64, y: f64, w: f64, h: f64) {
    let (cx, cy) = (x + w / 2.0, y + h / 2.0);
    match shape {
        NodeShape::Rectangle => rounded_rect_path(ctx, x, y, w, h, 4.0),
        NodeShape::RoundedRect => rounded_rect_path(ctx, x, y, w, h, 14.0),
        NodeShape::Circle => {
            ctx.begin_path();
            let _ = ctx.ellipse(cx, cy, w / 2.0, h / 2.0, 0.0, 0.0, TAU);
        }
        NodeShape::Diamond => polygon(ctx, &[(cx, y), (x + w, cy), (cx, y + h), (x, cy)]),
        NodeShape::Hexagon => {
            let inset = (w * 0.15).min(h / 2.0);
            polygon(
                ctx,
                &[
                    (x + inset, y),
                    (x + w - inset, y),
                    (x + w, cy),
                    (x + w - inset, y + h),
                    (x + inset, y + h),
                    (x, cy),
                ],
            );
        }
        NodeShape::Cylinder => {
            let (rx, ry) = (w / 2.0, cylinder_cap(h));
            ctx.begin_path();
            ctx.move_to(x, y + ry);
            ctx.line_to(x, y + h - ry);
            let _ = ctx.ellipse_with_anticlockwise(cx, y + h - ry, rx, ry, 0.0, PI, 0.0, true);
            ctx.line_to(x + w, y + ry);
            let _ = ctx.ellipse_with_anticlockwise(cx, y + ry, rx, ry, 0.0, 0.0, PI, true);
            ctx.close_path();
        }
    }
}

fn draw_node_selection(ctx: &CanvasRenderingContext2d, node: &Node, zoom: f64, palette: &CanvasPalette) {
    let b = node_bounds(node).inflate(4.0 / zoom as f32);
    ctx.save();
    ctx.set_stroke_style_str(palette.selection);
    ctx.set_line_width(2.0 / zoom);
    rounded_rect_path(ctx, b.x as f64, b.y as f64, b.width as f64, b.height as f64, 6.0);
    ctx.stroke();
    ctx.restore();
    if !node.is_connector_handle {
        draw_ports(ctx, node, zoom, palette);
    }
}

fn draw_ports(ctx: &CanvasRenderingContext2d, node: &Node, zoom: f64, palette: &CanvasPalette) {
    ctx.save();
    ctx.set_fill_style_str(palette.handle_fill);
    ctx.set_stroke_style_str(palette.selection);
    ctx.set_line_width(1.5 / zoom);
    for port in Port::ALL {
        let p = port_position(node, port);
        ctx.begin_path();
        let _ = ctx.arc(p.x as f64, p.y as f64, 4.0 / zoom, 0.0, TAU);
        ctx.fill();
        ctx.stroke();
    }
    ctx.restore();
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// Direction of travel reversed at the start of a path, for start arrows.
fn start_angle(route: &EdgeRoute) -> f64 {
    let back = match route.path.segments().next() {
        Some(PathSeg::Line(l)) => l.p0 - l.p1,
        Some(PathSeg::Quad(q)) => q.p0 - q.p1,
        Some(PathSeg::Cubic(c)) => c.p0 - c.p1,
        None => route.start - route.end,
    };
    if back.hypot() > f64::EPSILON {
        back.atan2()
    } else {
        (route.start - route.end).atan2()
    }
}

fn draw_edge(
    ctx: &CanvasRenderingContext2d,
    edge: &Edge,
    route: &EdgeRoute,
    selected: bool,
    zoom: f64,
    palette: &CanvasPalette,
) {
    let color = if edge.is_exception_path {
        palette.exception
    } else {
        rail_color(edge.rail)
    };
    let width = edge.thickness.max(0.5) as f64;

    ctx.save();
    if selected {
        ctx.set_stroke_style_str(palette.selection);
        ctx.set_global_alpha(0.25);
        ctx.set_line_width(width + 6.0 / zoom);
        trace_path(ctx, &route.path);
        ctx.stroke();
        ctx.set_global_alpha(1.0);
    }

    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width);
    match edge.style {
        LineStyle::Solid => {}
        LineStyle::Dashed => set_dash(ctx, &[8.0, 5.0]),
        LineStyle::Dotted => set_dash(ctx, &[2.0, 4.0]),
    }
    trace_path(ctx, &route.path);
    ctx.stroke();
    set_dash(ctx, &[]);

    let size = 8.0 + width * 1.5;
    if edge.show_arrow_head {
        if matches!(edge.direction, FlowDirection::Forward | FlowDirection::Bidirectional) {
            fill_triangle(ctx, arrow_head(route.end, route.end_angle, size), color);
        }
        if matches!(edge.direction, FlowDirection::Reverse | FlowDirection::Bidirectional) {
            fill_triangle(ctx, arrow_head(route.start, start_angle(route), size), color);
        }
    }
    if edge.show_mid_arrow {
        let angle = match edge.direction {
            FlowDirection::Reverse => route.mid_angle + PI,
            _ => route.mid_angle,
        };
        let tip = route.label_pos + kurbo::Vec2::new(angle.cos(), angle.sin()) * (size / 2.0);
        fill_triangle(ctx, arrow_head(tip, angle, size), color);
    }

    let mut caption_y = route.label_pos.y;
    if let Some(seq) = edge.sequence {
        draw_sequence_badge(ctx, route.label_pos, seq, color);
        caption_y += 18.0;
    }
    if let Some(caption) = edge_caption(edge) {
        draw_caption(ctx, Point::new(route.label_pos.x, caption_y), &caption, color, palette);
    }
    ctx.restore();
}

fn draw_sequence_badge(ctx: &CanvasRenderingContext2d, at: Point, seq: u32, color: &str) {
    ctx.save();
    ctx.set_fill_style_str(color);
    ctx.begin_path();
    let _ = ctx.arc(at.x, at.y, 10.0, 0.0, TAU);
    ctx.fill();
    ctx.set_fill_style_str("#FFFFFF");
    ctx.set_font("bold 11px Inter, system-ui, sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(&seq.to_string(), at.x, at.y);
    ctx.restore();
}

fn draw_caption(ctx: &CanvasRenderingContext2d, at: Point, text: &str, color: &str, palette: &CanvasPalette) {
    ctx.save();
    ctx.set_font("11px Inter, system-ui, sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let width = ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0);
    ctx.set_fill_style_str(palette.bg);
    rounded_rect_path(ctx, at.x - width / 2.0 - 4.0, at.y - 8.0, width + 8.0, 16.0, 4.0);
    ctx.fill();
    ctx.set_fill_style_str(color);
    let _ = ctx.fill_text(text, at.x, at.y);
    ctx.restore();
}

fn draw_handle(ctx: &CanvasRenderingContext2d, at: Point, radius: f64, zoom: f64, palette: &CanvasPalette) {
    ctx.save();
    ctx.set_fill_style_str(palette.handle_fill);
    ctx.set_stroke_style_str(palette.selection);
    ctx.set_line_width(2.0 / zoom);
    ctx.begin_path();
    let _ = ctx.arc(at.x, at.y, radius * 0.75, 0.0, TAU);
    ctx.fill();
    ctx.stroke();
    ctx.restore();
}

// ─── Feedback ────────────────────────────────────────────────────────────

fn draw_stroke(ctx: &CanvasRenderingContext2d, points: &[Position], color: &str, width: f64) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    ctx.save();
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width);
    ctx.set_line_cap("round");
    ctx.set_line_join("round");
    ctx.begin_path();
    ctx.move_to(first.x as f64, first.y as f64);
    for p in rest {
        ctx.line_to(p.x as f64, p.y as f64);
    }
    ctx.stroke();
    ctx.restore();
}

fn draw_snap_guide(ctx: &CanvasRenderingContext2d, x: f64, y: f64, view: &Bounds, zoom: f64, palette: &CanvasPalette) {
    ctx.save();
    ctx.set_stroke_style_str(palette.guide);
    ctx.set_line_width(1.0 / zoom);
    set_dash(ctx, &[4.0 / zoom, 4.0 / zoom]);
    ctx.begin_path();
    ctx.move_to(x, view.y as f64);
    ctx.line_to(x, (view.y + view.height) as f64);
    ctx.move_to(view.x as f64, y);
    ctx.line_to((view.x + view.width) as f64, y);
    ctx.stroke();
    ctx.restore();
}

/// Rubber-band selection rectangle, in world space.
fn draw_marquee_rect(ctx: &CanvasRenderingContext2d, rect: &Bounds, zoom: f64, palette: &CanvasPalette) {
    let (x, y, w, h) = (rect.x as f64, rect.y as f64, rect.width as f64, rect.height as f64);
    if w * zoom < 1.0 && h * zoom < 1.0 {
        return;
    }
    ctx.save();
    ctx.set_fill_style_str("rgba(37, 99, 235, 0.08)");
    ctx.fill_rect(x, y, w, h);
    ctx.set_stroke_style_str(palette.selection);
    ctx.set_line_width(1.0 / zoom);
    set_dash(ctx, &[4.0 / zoom, 4.0 / zoom]);
    ctx.stroke_rect(x, y, w, h);
    ctx.restore();
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn trace_path(ctx: &CanvasRenderingContext2d, path: &BezPath) {
    ctx.begin_path();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathEl::LineTo(p) => ctx.line_to(p.x, p.y),
            PathEl::QuadTo(c, p) => ctx.quadratic_curve_to(c.x, c.y, p.x, p.y),
            PathEl::CurveTo(a, b, p) => ctx.bezier_curve_to(a.x, a.y, b.x, b.y, p.x, p.y),
            PathEl::ClosePath => ctx.close_path(),
        }
    }
}

fn fill_triangle(ctx: &CanvasRenderingContext2d, [a, b, c]: [Point; 3], color: &str) {
    ctx.save();
    ctx.set_fill_style_str(color);
    ctx.begin_path();
    ctx.move_to(a.x, a.y);
    ctx.line_to(b.x, b.y);
    ctx.line_to(c.x, c.y);
    ctx.close_path();
    ctx.fill();
    ctx.restore();
}

fn set_dash(ctx: &CanvasRenderingContext2d, segments: &[f64]) {
    let array = js_sys::Array::new();
    for s in segments {
        array.push(&JsValue::from_f64(*s));
    }
    let _ = ctx.set_line_dash(&array);
}

fn polygon(ctx: &CanvasRenderingContext2d, points: &[(f64, f64)]) {
    ctx.begin_path();
    for (i, (x, y)) in points.iter().enumerate() {
        if i == 0 {
            ctx.move_to(*x, *y);
        } else {
            ctx.line_to(*x, *y);
        }
    }
    ctx.close_path();
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}
