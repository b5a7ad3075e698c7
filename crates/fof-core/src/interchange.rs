//! Versioned JSON envelope for import/export.
//!
//! ```json
//! { "version": 2, "diagram": { "nodes": [], "edges": [], "drawings": [] }, "layout": {} }
//! ```
//!
//! Export is a straight serde dump. Import is deliberately lenient below the
//! envelope: every node/edge/drawing field is read on its own and unknown
//! enum values fall back to a documented default instead of failing the
//! whole file. Only a missing envelope shape (no diagram, nodes not a list)
//! rejects the import. Version 1 files kept `nodes`/`edges` at the top level
//! and are still accepted.
//!
//! Fallbacks: type → `other`, shape → `rectangle`, rail → blank,
//! direction → `forward`, style → `solid`, pathType → `bezier`,
//! source port → right, target port → left. Layout settings are read the
//! same way: lane grouping → off, an unreadable number or flag → its
//! default, and lane heights or grid sizes out of range are clamped.

use crate::error::ImportError;
use crate::id::{DrawingId, EdgeId, NodeId};
use crate::layout::{
    GridSettings, LaneConfig, LaneGrouping, LayoutSettings, Swimlane, clamp_grid_size, clamp_lane_height,
};
use crate::model::*;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Version written by `export_json`.
pub const FORMAT_VERSION: i64 = 2;

type Object = Map<String, Value>;

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    version: i64,
    diagram: &'a Diagram,
    layout: &'a LayoutSettings,
}

/// Counts of everything the importer had to repair or discard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub fallbacks: usize,
    pub dropped_nodes: usize,
    pub dropped_edges: usize,
    pub dropped_drawings: usize,
    pub pruned_handles: usize,
}

impl SanitizeReport {
    pub fn is_clean(&self) -> bool {
        *self == SanitizeReport::default()
    }
}

/// A successfully parsed envelope.
#[derive(Debug, Clone)]
pub struct Imported {
    pub version: i64,
    pub diagram: Diagram,
    pub layout: LayoutSettings,
    pub report: SanitizeReport,
}

/// Serialize a diagram and its layout settings into the current envelope.
pub fn export_json(diagram: &Diagram, layout: &LayoutSettings) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&EnvelopeOut {
        version: FORMAT_VERSION,
        diagram,
        layout,
    })
}

/// Parse an envelope. On error nothing has been built, so callers can keep
/// their current diagram untouched.
pub fn import_json(text: &str) -> Result<Imported, ImportError> {
    let root: Value = serde_json::from_str(text)?;
    let root = root.as_object().ok_or(ImportError::MissingField("<root>"))?;

    let version = match root.get("version") {
        Some(v) => v.as_i64().ok_or(ImportError::MissingField("version"))?,
        None => 1,
    };
    if version > FORMAT_VERSION || version < 1 {
        return Err(ImportError::UnsupportedVersion(version));
    }

    let body: &Object = match root.get("diagram") {
        Some(d) => d.as_object().ok_or(ImportError::MissingField("diagram"))?,
        None if version == 1 && root.contains_key("nodes") => root,
        None => return Err(ImportError::MissingField("diagram")),
    };

    let raw_nodes = body
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or(ImportError::MissingField("diagram.nodes"))?;
    let raw_edges = optional_array(body, "edges", "diagram.edges")?;
    let raw_drawings = optional_array(body, "drawings", "diagram.drawings")?;

    let mut report = SanitizeReport::default();
    let mut diagram = Diagram::new();

    let mut seen_nodes = HashSet::new();
    for raw in raw_nodes {
        match sanitize_node(raw, &mut report) {
            Some(node) if seen_nodes.insert(node.id) => diagram.nodes.push(node),
            _ => report.dropped_nodes += 1,
        }
    }

    let mut seen_edges = HashSet::new();
    for raw in raw_edges {
        match sanitize_edge(raw, &mut report) {
            Some(edge) if seen_edges.insert(edge.id) => diagram.edges.push(edge),
            _ => report.dropped_edges += 1,
        }
    }
    report.dropped_edges += diagram.retain_valid_edges();
    report.pruned_handles += diagram.prune_orphan_handles().len();

    for raw in raw_drawings {
        match sanitize_drawing(raw, &mut report) {
            Some(drawing) => diagram.drawings.push(drawing),
            None => report.dropped_drawings += 1,
        }
    }

    let layout = sanitize_layout(root.get("layout"), &mut report);

    if !report.is_clean() {
        log::warn!("import sanitized: {report:?}");
    }
    log::info!(
        "imported v{version} diagram: {} nodes, {} edges, {} drawings",
        diagram.nodes.len(),
        diagram.edges.len(),
        diagram.drawings.len()
    );

    Ok(Imported {
        version,
        diagram,
        layout,
        report,
    })
}

fn optional_array<'a>(
    body: &'a Object,
    key: &str,
    field: &'static str,
) -> Result<&'a [Value], ImportError> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ImportError::MissingField(field)),
    }
}

// ─── Layout ──────────────────────────────────────────────────────────────

/// Read the `layout` block field by field. A bad field falls back on its
/// own; its neighbours are kept.
fn sanitize_layout(raw: Option<&Value>, report: &mut SanitizeReport) -> LayoutSettings {
    let obj = match raw {
        None | Some(Value::Null) => return LayoutSettings::default(),
        Some(Value::Object(obj)) => obj,
        Some(other) => {
            log::warn!("layout is not an object ({other}), using defaults");
            report.fallbacks += 1;
            return LayoutSettings::default();
        }
    };
    LayoutSettings {
        swimlanes: match sub_object(obj, "swimlanes", report) {
            Some(lanes) => sanitize_lanes(lanes, report),
            None => LaneConfig::default(),
        },
        grid: match sub_object(obj, "grid", report) {
            Some(grid) => sanitize_grid(grid, report),
            None => GridSettings::default(),
        },
    }
}

fn sub_object<'a>(obj: &'a Object, key: &str, report: &mut SanitizeReport) -> Option<&'a Object> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::Object(inner)) => Some(inner),
        Some(other) => {
            log::warn!("layout.{key} is not an object ({other}), using defaults");
            report.fallbacks += 1;
            None
        }
    }
}

fn sanitize_lanes(obj: &Object, report: &mut SanitizeReport) -> LaneConfig {
    let defaults = LaneConfig::default();
    let lanes = match obj.get("lanes") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let lane = item.as_object().and_then(|l| {
                    let id = l.get("id").and_then(Value::as_u64).and_then(|id| u32::try_from(id).ok())?;
                    let label = str_field(l, &["label"]).unwrap_or_default().to_string();
                    Some(Swimlane { id, label })
                });
                if lane.is_none() {
                    log::warn!("dropping malformed swimlane {item}");
                    report.fallbacks += 1;
                }
                lane
            })
            .collect(),
        Some(other) => {
            log::warn!("swimlanes.lanes is not a list ({other}), ignoring");
            report.fallbacks += 1;
            Vec::new()
        }
    };
    LaneConfig {
        grouping: enum_field(obj, "grouping", LaneGrouping::from_wire, report),
        lane_height: layout_number(obj, "laneHeight", defaults.lane_height, clamp_lane_height, report),
        lanes,
    }
}

fn sanitize_grid(obj: &Object, report: &mut SanitizeReport) -> GridSettings {
    let defaults = GridSettings::default();
    GridSettings {
        visible: layout_bool(obj, "visible", defaults.visible, report),
        snap: layout_bool(obj, "snap", defaults.snap, report),
        size: layout_number(obj, "size", defaults.size, clamp_grid_size, report),
    }
}

/// A numeric layout setting. Unreadable values fall back to `default`;
/// values `clamp` has to move also count as a fallback.
fn layout_number(
    obj: &Object,
    key: &str,
    default: f32,
    clamp: fn(f32) -> f32,
    report: &mut SanitizeReport,
) -> f32 {
    if matches!(obj.get(key), None | Some(Value::Null)) {
        return default;
    }
    match f32_field(obj, key) {
        Some(n) => {
            let clamped = clamp(n);
            if clamped != n {
                log::warn!("layout {key} {n} out of range, using {clamped}");
                report.fallbacks += 1;
            }
            clamped
        }
        None => {
            log::warn!("unreadable layout {key}, using {default}");
            report.fallbacks += 1;
            default
        }
    }
}

fn layout_bool(obj: &Object, key: &str, default: bool, report: &mut SanitizeReport) -> bool {
    match obj.get(key) {
        None | Some(Value::Null) => default,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            log::warn!("non-boolean layout {key} value {other}, using {default}");
            report.fallbacks += 1;
            default
        }
    }
}

// ─── Field readers ───────────────────────────────────────────────────────

fn str_field<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_str))
}

fn f32_field(obj: &Object, key: &str) -> Option<f32> {
    let v = obj.get(key)?;
    let n = v
        .as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))?;
    n.is_finite().then_some(n as f32)
}

fn bool_field(obj: &Object, key: &str) -> Option<bool> {
    obj.get(key).and_then(Value::as_bool)
}

fn opt_string(obj: &Object, key: &str) -> Option<String> {
    str_field(obj, &[key])
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse an enum field, counting a fallback when the value is present but
/// unrecognized.
fn enum_field<T: Default>(
    obj: &Object,
    key: &str,
    parse: fn(&str) -> Option<T>,
    report: &mut SanitizeReport,
) -> T {
    match obj.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(Value::String(s)) => parse(s).unwrap_or_else(|| {
            log::warn!("unknown {key} value {s:?}, using default");
            report.fallbacks += 1;
            T::default()
        }),
        Some(other) => {
            log::warn!("non-string {key} value {other}, using default");
            report.fallbacks += 1;
            T::default()
        }
    }
}

fn port_field(obj: &Object, keys: &[&str], fallback: Port, report: &mut SanitizeReport) -> Port {
    let raw = keys.iter().find_map(|k| obj.get(*k));
    match raw.and_then(Value::as_u64) {
        Some(idx) => u8::try_from(idx)
            .ok()
            .and_then(Port::from_index)
            .unwrap_or_else(|| {
                report.fallbacks += 1;
                fallback
            }),
        None => {
            if raw.is_some() {
                report.fallbacks += 1;
            }
            fallback
        }
    }
}

fn metadata_field(obj: &Object) -> Metadata {
    let mut meta = Metadata::new();
    if let Some(Value::Object(entries)) = obj.get("metadata") {
        for (k, v) in entries {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if let Err(e) = meta.insert(k, value) {
                log::warn!("dropping metadata entry {k:?}: {e}");
            }
        }
    }
    meta
}

fn position_field(obj: &Object, report: &mut SanitizeReport) -> Position {
    if let Some(Value::Object(pos)) = obj.get("position")
        && let (Some(x), Some(y)) = (f32_field(pos, "x"), f32_field(pos, "y"))
    {
        return Position::new(x, y);
    }
    // Version 1 stored coordinates on the node itself.
    if let (Some(x), Some(y)) = (f32_field(obj, "x"), f32_field(obj, "y")) {
        return Position::new(x, y);
    }
    report.fallbacks += 1;
    Position::ZERO
}

// ─── Per-record sanitizers ───────────────────────────────────────────────

fn sanitize_node(raw: &Value, report: &mut SanitizeReport) -> Option<Node> {
    let obj = raw.as_object()?;
    let id = str_field(obj, &["id"]).filter(|s| !s.is_empty())?;

    let mut node = Node::new(
        NodeId::intern(id),
        enum_field(obj, "type", EntityKind::from_wire, report),
        str_field(obj, &["label"]).unwrap_or_default(),
        position_field(obj, report),
    );
    node.shape = enum_field(obj, "shape", NodeShape::from_wire, report);
    node.width = f32_field(obj, "width").filter(|w| *w > 0.0);
    node.height = f32_field(obj, "height").filter(|h| *h > 0.0);
    node.z_index = obj
        .get("zIndex")
        .and_then(Value::as_i64)
        .and_then(|z| i32::try_from(z).ok())
        .unwrap_or(0);
    node.swimlane_id = obj
        .get("swimlaneId")
        .and_then(Value::as_u64)
        .and_then(|l| u32::try_from(l).ok());
    node.color = opt_string(obj, "color");
    node.is_connector_handle = bool_field(obj, "isConnectorHandle").unwrap_or(false);
    node.account_type = opt_string(obj, "accountType");
    node.description = opt_string(obj, "description");
    node.metadata = metadata_field(obj);
    Some(node)
}

fn sanitize_edge(raw: &Value, report: &mut SanitizeReport) -> Option<Edge> {
    let obj = raw.as_object()?;
    let source = str_field(obj, &["sourceId", "source"]).filter(|s| !s.is_empty())?;
    let target = str_field(obj, &["targetId", "target"]).filter(|s| !s.is_empty())?;
    let id = match str_field(obj, &["id"]).filter(|s| !s.is_empty()) {
        Some(id) => EdgeId::intern(id),
        None => {
            report.fallbacks += 1;
            EdgeId::with_prefix("edge")
        }
    };

    let mut edge = Edge::new(
        id,
        NodeId::intern(source),
        port_field(obj, &["sourcePortIdx", "sourcePort"], Port::Right, report),
        NodeId::intern(target),
        port_field(obj, &["targetPortIdx", "targetPort"], Port::Left, report),
    );
    edge.rail = enum_field(obj, "rail", PaymentRail::from_wire, report);
    edge.direction = enum_field(obj, "direction", FlowDirection::from_wire, report);
    edge.label = str_field(obj, &["label"]).unwrap_or_default().to_string();
    edge.style = enum_field(obj, "style", LineStyle::from_wire, report);
    edge.path_type = enum_field(obj, "pathType", PathType::from_wire, report);
    edge.thickness = f32_field(obj, "thickness")
        .filter(|t| *t > 0.0)
        .unwrap_or(DEFAULT_EDGE_THICKNESS);
    edge.show_arrow_head = bool_field(obj, "showArrowHead").unwrap_or(true);
    edge.show_mid_arrow = bool_field(obj, "showMidArrow").unwrap_or(false);
    edge.curvature = f32_field(obj, "curvature");
    edge.sequence = obj
        .get("sequence")
        .and_then(Value::as_u64)
        .and_then(|s| u32::try_from(s).ok());
    edge.amount = obj
        .get("amount")
        .and_then(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        })
        .filter(|a: &f64| a.is_finite());
    edge.currency = opt_string(obj, "currency");
    edge.is_fx = bool_field(obj, "isFX").unwrap_or(false);
    edge.is_exception_path = bool_field(obj, "isExceptionPath").unwrap_or(false);
    edge.timing = opt_string(obj, "timing");
    edge.notes = opt_string(obj, "notes");
    edge.metadata = metadata_field(obj);
    Some(edge)
}

fn sanitize_drawing(raw: &Value, report: &mut SanitizeReport) -> Option<DrawingPath> {
    let obj = raw.as_object()?;
    let points: Vec<Position> = obj
        .get("points")?
        .as_array()?
        .iter()
        .filter_map(|p| {
            let p = p.as_object()?;
            Some(Position::new(f32_field(p, "x")?, f32_field(p, "y")?))
        })
        .collect();
    if points.is_empty() {
        return None;
    }
    let id = match str_field(obj, &["id"]).filter(|s| !s.is_empty()) {
        Some(id) => DrawingId::intern(id),
        None => {
            report.fallbacks += 1;
            DrawingId::with_prefix("drawing")
        }
    };
    Some(DrawingPath {
        id,
        points,
        color: str_field(obj, &["color"]).unwrap_or(DEFAULT_INK).to_string(),
        width: f32_field(obj, "width").filter(|w| *w > 0.0).unwrap_or(2.0),
    })
}

/// Ink color for strokes that do not name one.
pub const DEFAULT_INK: &str = "#1f2937";
