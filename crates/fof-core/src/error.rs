//! Error types for diagram mutation, import and export.

use crate::id::{EdgeId, NodeId};
use thiserror::Error;

/// A structural mutation the diagram refused to apply.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagramError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("unknown edge {0}")]
    UnknownEdge(EdgeId),
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("edge {0} already exists")]
    DuplicateEdge(EdgeId),
    #[error("port index {0} is out of range (expected 0..=3)")]
    InvalidPort(u8),
    #[error("metadata is limited to {0} entries")]
    MetadataFull(usize),
    #[error("invalid metadata key {0:?}")]
    MetadataKey(String),
}

/// Why an import was rejected. The current diagram is never touched.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing or malformed field `{0}`")]
    MissingField(&'static str),
    #[error("unsupported format version {0}")]
    UnsupportedVersion(i64),
}

/// Failure reported by a raster export collaborator.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: the diagram is empty")]
    EmptyDiagram,
    #[error("export backend failed: {0}")]
    Backend(String),
}
