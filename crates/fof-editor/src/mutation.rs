//! Graph mutations proposed by the canvas engine and the editor.
//!
//! A mutation is a plain value; nothing changes until the document commits
//! it (see `document::apply_mutation`).

use fof_core::error::DiagramError;
use fof_core::id::{EdgeId, NodeId};
use fof_core::model::*;

/// An edit to one inspector-visible node property.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeField {
    Label(String),
    Kind(EntityKind),
    Shape(NodeShape),
    Color(Option<String>),
    AccountType(Option<String>),
    Description(Option<String>),
    Width(Option<f32>),
    Height(Option<f32>),
    ZIndex(i32),
    Swimlane(Option<u32>),
    /// Set (`Some`) or remove (`None`) a custom metadata entry.
    Metadata(String, Option<String>),
}

impl NodeField {
    /// Stable name, used as the history merge key.
    pub fn name(&self) -> &'static str {
        match self {
            NodeField::Label(_) => "label",
            NodeField::Kind(_) => "type",
            NodeField::Shape(_) => "shape",
            NodeField::Color(_) => "color",
            NodeField::AccountType(_) => "accountType",
            NodeField::Description(_) => "description",
            NodeField::Width(_) => "width",
            NodeField::Height(_) => "height",
            NodeField::ZIndex(_) => "zIndex",
            NodeField::Swimlane(_) => "swimlaneId",
            NodeField::Metadata(..) => "metadata",
        }
    }

    pub fn apply(self, node: &mut Node) -> Result<(), DiagramError> {
        match self {
            NodeField::Label(v) => node.label = v,
            NodeField::Kind(v) => node.kind = v,
            NodeField::Shape(v) => node.shape = v,
            NodeField::Color(v) => node.color = v,
            NodeField::AccountType(v) => node.account_type = v,
            NodeField::Description(v) => node.description = v,
            NodeField::Width(v) => node.width = v.filter(|w| *w > 0.0),
            NodeField::Height(v) => node.height = v.filter(|h| *h > 0.0),
            NodeField::ZIndex(v) => node.z_index = v,
            NodeField::Swimlane(v) => node.swimlane_id = v,
            NodeField::Metadata(key, Some(value)) => node.metadata.insert(&key, value)?,
            NodeField::Metadata(key, None) => {
                node.metadata.remove(&key);
            }
        }
        Ok(())
    }
}

/// An edit to one inspector-visible edge property.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeField {
    Label(String),
    Rail(PaymentRail),
    Direction(FlowDirection),
    Style(LineStyle),
    PathType(PathType),
    Thickness(f32),
    ShowArrowHead(bool),
    ShowMidArrow(bool),
    Curvature(Option<f32>),
    Sequence(Option<u32>),
    Amount(Option<f64>),
    Currency(Option<String>),
    IsFx(bool),
    IsExceptionPath(bool),
    Timing(Option<String>),
    Notes(Option<String>),
    SourcePort(Port),
    TargetPort(Port),
    Metadata(String, Option<String>),
}

impl EdgeField {
    pub fn name(&self) -> &'static str {
        match self {
            EdgeField::Label(_) => "label",
            EdgeField::Rail(_) => "rail",
            EdgeField::Direction(_) => "direction",
            EdgeField::Style(_) => "style",
            EdgeField::PathType(_) => "pathType",
            EdgeField::Thickness(_) => "thickness",
            EdgeField::ShowArrowHead(_) => "showArrowHead",
            EdgeField::ShowMidArrow(_) => "showMidArrow",
            EdgeField::Curvature(_) => "curvature",
            EdgeField::Sequence(_) => "sequence",
            EdgeField::Amount(_) => "amount",
            EdgeField::Currency(_) => "currency",
            EdgeField::IsFx(_) => "isFX",
            EdgeField::IsExceptionPath(_) => "isExceptionPath",
            EdgeField::Timing(_) => "timing",
            EdgeField::Notes(_) => "notes",
            EdgeField::SourcePort(_) => "sourcePortIdx",
            EdgeField::TargetPort(_) => "targetPortIdx",
            EdgeField::Metadata(..) => "metadata",
        }
    }

    /// True for the presentation fields remembered as sticky defaults.
    pub fn is_sticky(&self) -> bool {
        matches!(
            self,
            EdgeField::Direction(_)
                | EdgeField::Style(_)
                | EdgeField::PathType(_)
                | EdgeField::Thickness(_)
                | EdgeField::ShowArrowHead(_)
                | EdgeField::ShowMidArrow(_)
        )
    }

    pub fn apply(self, edge: &mut Edge) -> Result<(), DiagramError> {
        match self {
            EdgeField::Label(v) => edge.label = v,
            EdgeField::Rail(v) => edge.rail = v,
            EdgeField::Direction(v) => edge.direction = v,
            EdgeField::Style(v) => edge.style = v,
            EdgeField::PathType(v) => edge.path_type = v,
            EdgeField::Thickness(v) => {
                if v > 0.0 && v.is_finite() {
                    edge.thickness = v;
                }
            }
            EdgeField::ShowArrowHead(v) => edge.show_arrow_head = v,
            EdgeField::ShowMidArrow(v) => edge.show_mid_arrow = v,
            EdgeField::Curvature(v) => edge.curvature = v.filter(|c| c.is_finite()),
            EdgeField::Sequence(v) => edge.sequence = v,
            EdgeField::Amount(v) => edge.amount = v.filter(|a| a.is_finite()),
            EdgeField::Currency(v) => edge.currency = v,
            EdgeField::IsFx(v) => edge.is_fx = v,
            EdgeField::IsExceptionPath(v) => edge.is_exception_path = v,
            EdgeField::Timing(v) => edge.timing = v,
            EdgeField::Notes(v) => edge.notes = v,
            EdgeField::SourcePort(p) => edge.source_port = p,
            EdgeField::TargetPort(p) => edge.target_port = p,
            EdgeField::Metadata(key, Some(value)) => edge.metadata.insert(&key, value)?,
            EdgeField::Metadata(key, None) => {
                edge.metadata.remove(&key);
            }
        }
        Ok(())
    }
}

/// A single structural or property change to the diagram.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    /// Place a node at an absolute world position, optionally updating its
    /// swimlane.
    MoveNode {
        id: NodeId,
        position: Position,
        swimlane: Option<u32>,
    },
    AddNode {
        node: Box<Node>,
    },
    /// Remove nodes with their edges and any handles left orphaned.
    RemoveNodes {
        ids: Vec<NodeId>,
    },
    AddEdge {
        edge: Box<Edge>,
    },
    /// Remove an edge and prune the handles it orphans.
    RemoveEdge {
        id: EdgeId,
    },
    /// Re-target one end of an edge, keeping its id and every other field.
    ReconnectEdge {
        id: EdgeId,
        end: EdgeEnd,
        node: NodeId,
        port: Port,
    },
    SetNodeField {
        id: NodeId,
        field: NodeField,
    },
    SetEdgeField {
        id: EdgeId,
        field: EdgeField,
    },
    AddDrawing {
        drawing: Box<DrawingPath>,
    },
    /// Swap in a whole new diagram (import).
    ReplaceDiagram {
        diagram: Box<Diagram>,
    },
}
