//! Raster export collaborator.
//!
//! The engine only decides *what* region to export; turning it into PNG,
//! SVG or PDF bytes belongs to the host.

use crate::error::ExportError;
use crate::geometry::node_bounds;
use crate::model::{Bounds, Diagram, Position};
use serde::{Deserialize, Serialize};

/// Default margin around exported content, in world units.
pub const EXPORT_PADDING: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Svg,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

/// Renders a region of the host surface into bytes.
pub trait RasterExporter {
    type Surface;

    fn export(
        &mut self,
        surface: &Self::Surface,
        bounds: Bounds,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ExportError>;
}

/// World-space region covering every node and ink stroke, grown by
/// `padding`.
pub fn export_bounds(diagram: &Diagram, padding: f32) -> Result<Bounds, ExportError> {
    let nodes = diagram.nodes.iter().map(node_bounds);
    let strokes = diagram.drawings.iter().filter_map(|d| {
        let pad = d.width / 2.0;
        points_bounds(&d.points).map(|b| b.inflate(pad))
    });
    nodes
        .chain(strokes)
        .reduce(|acc, b| acc.union(&b))
        .map(|b| b.inflate(padding))
        .ok_or(ExportError::EmptyDiagram)
}

fn points_bounds(points: &[Position]) -> Option<Bounds> {
    let first = points.first()?;
    let (mut min, mut max) = (*first, *first);
    for p in &points[1..] {
        min = Position::new(min.x.min(p.x), min.y.min(p.y));
        max = Position::new(max.x.max(p.x), max.y.max(p.y));
    }
    Some(Bounds::from_corners(min, max))
}
