//! Core data model for flow-of-funds diagrams.
//!
//! A diagram is a flat aggregate of entity nodes, payment-rail edges and
//! freehand drawings. Node positions are world-space top-left corners.
//! Edges reference nodes by id and must always resolve; removing a node
//! cascades to its edges and to any connector handle those edges leave
//! orphaned.

use crate::error::DiagramError;
use crate::geometry::node_bounds;
use crate::id::{DrawingId, EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ─── Plain geometry values ───────────────────────────────────────────────

/// A point in world (or screen) space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Width and height of a node box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    /// Build a normalized box from two opposite corners.
    pub fn from_corners(a: Position, b: Position) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive AABB overlap: boxes that merely touch count as intersecting.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x <= other.x + other.width
            && self.x + self.width >= other.x
            && self.y <= other.y + other.height
            && self.y + self.height >= other.y
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Bounds {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    /// Grow the box by `pad` on every side.
    pub fn inflate(&self, pad: f32) -> Bounds {
        Bounds {
            x: self.x - pad,
            y: self.y - pad,
            width: self.width + pad * 2.0,
            height: self.height + pad * 2.0,
        }
    }
}

// ─── Enumerations ────────────────────────────────────────────────────────

/// Lenient lookup of a wire string, shared by the enum fields below.
///
/// Tries the canonical serde spelling first, then a case-insensitive match.
fn from_wire<T: for<'de> Deserialize<'de>>(s: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .ok()
        .or_else(|| serde_json::from_value(serde_json::Value::String(s.to_lowercase())).ok())
}

/// Kind of financial entity a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Bank,
    SponsorBank,
    CentralBank,
    Processor,
    Gateway,
    CardNetwork,
    Acquirer,
    Issuer,
    Merchant,
    Customer,
    Business,
    Fintech,
    ProgramManager,
    Wallet,
    Ledger,
    Custodian,
    #[default]
    Other,
}

impl EntityKind {
    pub fn from_wire(s: &str) -> Option<Self> {
        from_wire(s)
    }

    /// Human-readable label used for freshly dropped nodes.
    pub fn display_name(self) -> &'static str {
        match self {
            EntityKind::Bank => "Bank",
            EntityKind::SponsorBank => "Sponsor Bank",
            EntityKind::CentralBank => "Central Bank",
            EntityKind::Processor => "Processor",
            EntityKind::Gateway => "Gateway",
            EntityKind::CardNetwork => "Card Network",
            EntityKind::Acquirer => "Acquirer",
            EntityKind::Issuer => "Issuer",
            EntityKind::Merchant => "Merchant",
            EntityKind::Customer => "Customer",
            EntityKind::Business => "Business",
            EntityKind::Fintech => "Fintech",
            EntityKind::ProgramManager => "Program Manager",
            EntityKind::Wallet => "Wallet",
            EntityKind::Ledger => "Ledger",
            EntityKind::Custodian => "Custodian",
            EntityKind::Other => "Entity",
        }
    }
}

/// Outline drawn for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeShape {
    #[default]
    Rectangle,
    #[serde(alias = "rounded")]
    RoundedRect,
    Circle,
    Diamond,
    Hexagon,
    Cylinder,
}

impl NodeShape {
    pub fn from_wire(s: &str) -> Option<Self> {
        from_wire(s)
    }
}

/// Payment rail carried by an edge. `Blank` means "not specified yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentRail {
    #[default]
    #[serde(rename = "")]
    Blank,
    #[serde(rename = "ach", alias = "ACH")]
    Ach,
    #[serde(rename = "wire", alias = "Wire")]
    Wire,
    #[serde(rename = "rtp", alias = "RTP")]
    Rtp,
    #[serde(rename = "fedNow", alias = "FedNow")]
    FedNow,
    #[serde(rename = "card", alias = "Card")]
    Card,
    #[serde(rename = "swift", alias = "SWIFT")]
    Swift,
    #[serde(rename = "sepa", alias = "SEPA")]
    Sepa,
    #[serde(rename = "check", alias = "Check")]
    Check,
    #[serde(rename = "crypto", alias = "Crypto")]
    Crypto,
    #[serde(rename = "bookTransfer", alias = "Book Transfer")]
    BookTransfer,
    #[serde(rename = "internal", alias = "Internal")]
    Internal,
}

impl PaymentRail {
    pub fn from_wire(s: &str) -> Option<Self> {
        from_wire(s)
    }
}

/// Which way money moves along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowDirection {
    #[default]
    Forward,
    Reverse,
    Bidirectional,
}

impl FlowDirection {
    pub fn from_wire(s: &str) -> Option<Self> {
        from_wire(s)
    }
}

/// Stroke pattern of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    pub fn from_wire(s: &str) -> Option<Self> {
        from_wire(s)
    }
}

/// Path generator used for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathType {
    #[default]
    Bezier,
    #[serde(alias = "step", alias = "elbow")]
    Orthogonal,
}

impl PathType {
    pub fn from_wire(s: &str) -> Option<Self> {
        from_wire(s)
    }
}

/// One of the four connection points on a node's bounding box.
///
/// Serialized as its index: 0 = top, 1 = right, 2 = bottom, 3 = left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Port {
    #[default]
    Top,
    Right,
    Bottom,
    Left,
}

impl Port {
    pub const ALL: [Port; 4] = [Port::Top, Port::Right, Port::Bottom, Port::Left];

    pub fn index(self) -> u8 {
        match self {
            Port::Top => 0,
            Port::Right => 1,
            Port::Bottom => 2,
            Port::Left => 3,
        }
    }

    pub fn from_index(idx: u8) -> Option<Self> {
        Port::ALL.get(idx as usize).copied()
    }

    /// Outward unit normal of the side this port sits on (y grows downward).
    pub fn normal(self) -> (f32, f32) {
        match self {
            Port::Top => (0.0, -1.0),
            Port::Right => (1.0, 0.0),
            Port::Bottom => (0.0, 1.0),
            Port::Left => (-1.0, 0.0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Port::Left | Port::Right)
    }
}

impl From<Port> for u8 {
    fn from(port: Port) -> u8 {
        port.index()
    }
}

impl TryFrom<u8> for Port {
    type Error = DiagramError;

    fn try_from(idx: u8) -> Result<Self, Self::Error> {
        Port::from_index(idx).ok_or(DiagramError::InvalidPort(idx))
    }
}

// ─── Extension metadata ──────────────────────────────────────────────────

/// Maximum number of custom metadata entries per node or edge.
pub const MAX_METADATA_ENTRIES: usize = 32;
/// Maximum byte length of a metadata key.
pub const MAX_METADATA_KEY_LEN: usize = 64;

/// Bounded string map for forward-compatible custom fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. New keys are rejected once the map is full.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) -> Result<(), DiagramError> {
        if key.is_empty() || key.len() > MAX_METADATA_KEY_LEN {
            return Err(DiagramError::MetadataKey(key.to_string()));
        }
        if !self.0.contains_key(key) && self.0.len() >= MAX_METADATA_ENTRIES {
            return Err(DiagramError::MetadataFull(MAX_METADATA_ENTRIES));
        }
        self.0.insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// An entity box (or a connector-handle anchor) on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub label: String,
    pub shape: NodeShape,
    /// World-space top-left corner.
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swimlane_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// True for the two anchors of a free-floating connector.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_connector_handle: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Node {
    pub fn new(id: NodeId, kind: EntityKind, label: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            kind,
            label: label.into(),
            shape: NodeShape::default(),
            position,
            width: None,
            height: None,
            z_index: 0,
            swimlane_id: None,
            color: None,
            is_connector_handle: false,
            account_type: None,
            description: None,
            metadata: Metadata::new(),
        }
    }

    /// A connector-handle anchor whose center sits at `center`.
    pub fn anchor(id: NodeId, center: Position) -> Self {
        let half = crate::geometry::ANCHOR_SIZE / 2.0;
        let mut node = Self::new(
            id,
            EntityKind::Other,
            String::new(),
            center.offset(-half, -half),
        );
        node.shape = NodeShape::Circle;
        node.is_connector_handle = true;
        node
    }

    pub fn with_shape(mut self, shape: NodeShape) -> Self {
        self.shape = shape;
        self
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// A payment-rail connector between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source_id: NodeId,
    pub target_id: NodeId,
    #[serde(rename = "sourcePortIdx")]
    pub source_port: Port,
    #[serde(rename = "targetPortIdx")]
    pub target_port: Port,
    #[serde(default)]
    pub rail: PaymentRail,
    #[serde(default)]
    pub direction: FlowDirection,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub style: LineStyle,
    #[serde(default)]
    pub path_type: PathType,
    #[serde(default = "default_thickness")]
    pub thickness: f32,
    #[serde(default = "default_true")]
    pub show_arrow_head: bool,
    #[serde(default)]
    pub show_mid_arrow: bool,
    /// Manual override of the parallel-edge fan-out offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curvature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, rename = "isFX")]
    pub is_fx: bool,
    #[serde(default)]
    pub is_exception_path: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

pub const DEFAULT_EDGE_THICKNESS: f32 = 2.0;

fn default_thickness() -> f32 {
    DEFAULT_EDGE_THICKNESS
}

fn default_true() -> bool {
    true
}

impl Edge {
    pub fn new(
        id: EdgeId,
        source_id: NodeId,
        source_port: Port,
        target_id: NodeId,
        target_port: Port,
    ) -> Self {
        Self {
            id,
            source_id,
            target_id,
            source_port,
            target_port,
            rail: PaymentRail::Blank,
            direction: FlowDirection::Forward,
            label: String::new(),
            style: LineStyle::Solid,
            path_type: PathType::Bezier,
            thickness: DEFAULT_EDGE_THICKNESS,
            show_arrow_head: true,
            show_mid_arrow: false,
            curvature: None,
            sequence: None,
            amount: None,
            currency: None,
            is_fx: false,
            is_exception_path: false,
            timing: None,
            notes: None,
            metadata: Metadata::new(),
        }
    }

    pub fn references(&self, node: NodeId) -> bool {
        self.source_id == node || self.target_id == node
    }

    /// True when both edges join the same unordered node pair.
    pub fn same_pair(&self, other: &Edge) -> bool {
        (self.source_id == other.source_id && self.target_id == other.target_id)
            || (self.source_id == other.target_id && self.target_id == other.source_id)
    }
}

/// Which end of an edge a handle controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeEnd {
    Source,
    Target,
}

// ─── Drawings ────────────────────────────────────────────────────────────

/// A freehand ink stroke. Never edited after creation, only removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingPath {
    pub id: DrawingId,
    pub points: Vec<Position>,
    pub color: String,
    pub width: f32,
}

// ─── Diagram aggregate ───────────────────────────────────────────────────

/// What a cascading removal took out of the diagram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeReport {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
    pub pruned_handles: Vec<NodeId>,
}

impl CascadeReport {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.pruned_handles.is_empty()
    }
}

/// The whole editable graph. Cloning it yields a history snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub drawings: Vec<DrawingPath>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Add a node. Ids must be unique.
    pub fn add_node(&mut self, node: Node) -> Result<(), DiagramError> {
        if self.contains_node(node.id) {
            return Err(DiagramError::DuplicateNode(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Add an edge. Both endpoints must already exist.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), DiagramError> {
        for endpoint in [edge.source_id, edge.target_id] {
            if !self.contains_node(endpoint) {
                return Err(DiagramError::UnknownNode(endpoint));
            }
        }
        if self.edge(edge.id).is_some() {
            return Err(DiagramError::DuplicateEdge(edge.id));
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn add_drawing(&mut self, drawing: DrawingPath) {
        self.drawings.push(drawing);
    }

    pub fn remove_drawing(&mut self, id: DrawingId) -> Option<DrawingPath> {
        let pos = self.drawings.iter().position(|d| d.id == id)?;
        Some(self.drawings.remove(pos))
    }

    /// Remove nodes, every edge touching them, and any connector handle
    /// left without edges.
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> CascadeReport {
        let doomed: HashSet<NodeId> = ids.iter().copied().collect();
        let mut report = CascadeReport::default();

        self.nodes.retain(|n| {
            if doomed.contains(&n.id) {
                report.nodes.push(n.id);
                false
            } else {
                true
            }
        });
        self.edges.retain(|e| {
            if doomed.contains(&e.source_id) || doomed.contains(&e.target_id) {
                report.edges.push(e.id);
                false
            } else {
                true
            }
        });
        report.pruned_handles = self.prune_orphan_handles();
        report
    }

    /// Remove edges by id and prune the handles they orphan.
    pub fn remove_edges(&mut self, ids: &[EdgeId]) -> CascadeReport {
        let mut report = CascadeReport::default();
        self.edges.retain(|e| {
            if ids.contains(&e.id) {
                report.edges.push(e.id);
                false
            } else {
                true
            }
        });
        report.pruned_handles = self.prune_orphan_handles();
        report
    }

    /// Drop connector-handle nodes that no edge references.
    pub fn prune_orphan_handles(&mut self) -> Vec<NodeId> {
        let referenced: HashSet<NodeId> = self
            .edges
            .iter()
            .flat_map(|e| [e.source_id, e.target_id])
            .collect();
        let mut pruned = Vec::new();
        self.nodes.retain(|n| {
            if n.is_connector_handle && !referenced.contains(&n.id) {
                pruned.push(n.id);
                false
            } else {
                true
            }
        });
        pruned
    }

    /// Remove edges whose source or target no longer exists.
    /// Returns how many were dropped.
    pub fn retain_valid_edges(&mut self) -> usize {
        let known: HashSet<NodeId> = self.nodes.iter().map(|n| n.id).collect();
        let before = self.edges.len();
        self.edges.retain(|e| {
            let ok = known.contains(&e.source_id) && known.contains(&e.target_id);
            if !ok {
                log::warn!(
                    "dropping edge {} with dangling endpoint ({} -> {})",
                    e.id,
                    e.source_id,
                    e.target_id
                );
            }
            ok
        });
        before - self.edges.len()
    }

    /// Every edge joining the unordered pair `{a, b}`, in document order.
    pub fn edges_between(&self, a: NodeId, b: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| {
            (e.source_id == a && e.target_id == b) || (e.source_id == b && e.target_id == a)
        })
    }

    /// Z-index for a node placed on top of everything else.
    pub fn next_z_index(&self) -> i32 {
        self.nodes.iter().map(|n| n.z_index).max().map_or(0, |z| z + 1)
    }

    /// Nodes in paint order: ascending z-index, document order breaking ties.
    pub fn nodes_by_z(&self) -> Vec<&Node> {
        let mut ordered: Vec<&Node> = self.nodes.iter().collect();
        ordered.sort_by_key(|n| n.z_index);
        ordered
    }

    /// Union of every node's bounding box, or `None` for an empty diagram.
    pub fn content_bounds(&self) -> Option<Bounds> {
        self.nodes
            .iter()
            .map(node_bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.drawings.is_empty()
    }
}
