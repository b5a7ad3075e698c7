//! Per-canvas session state: active tool, grid, swimlanes and the sticky
//! edge presentation defaults.
//!
//! Everything here is a plain value owned by the canvas engine, so tests
//! build isolated instances instead of sharing globals.

use crate::mutation::EdgeField;
use crate::tools::ToolKind;
use fof_core::layout::{GridSettings, LaneConfig, LayoutSettings};
use fof_core::model::{DEFAULT_EDGE_THICKNESS, Edge, FlowDirection, LineStyle, PathType};
use fof_render::hit::HitConfig;
use fof_render::route::RouteConfig;

/// Presentation settings applied to newly drawn edges. Updated whenever the
/// user edits one of these fields in the inspector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeDefaults {
    pub direction: FlowDirection,
    pub style: LineStyle,
    pub path_type: PathType,
    pub thickness: f32,
    pub show_arrow_head: bool,
    pub show_mid_arrow: bool,
}

impl Default for EdgeDefaults {
    fn default() -> Self {
        Self {
            direction: FlowDirection::Forward,
            style: LineStyle::Solid,
            path_type: PathType::Bezier,
            thickness: DEFAULT_EDGE_THICKNESS,
            show_arrow_head: true,
            show_mid_arrow: false,
        }
    }
}

impl EdgeDefaults {
    pub fn apply(&self, edge: &mut Edge) {
        edge.direction = self.direction;
        edge.style = self.style;
        edge.path_type = self.path_type;
        edge.thickness = self.thickness;
        edge.show_arrow_head = self.show_arrow_head;
        edge.show_mid_arrow = self.show_mid_arrow;
    }

    /// Remember a sticky field. Non-sticky fields are ignored.
    pub fn remember(&mut self, field: &EdgeField) {
        match field {
            EdgeField::Direction(v) => self.direction = *v,
            EdgeField::Style(v) => self.style = *v,
            EdgeField::PathType(v) => self.path_type = *v,
            EdgeField::Thickness(v) if *v > 0.0 && v.is_finite() => self.thickness = *v,
            EdgeField::ShowArrowHead(v) => self.show_arrow_head = *v,
            EdgeField::ShowMidArrow(v) => self.show_mid_arrow = *v,
            _ => {}
        }
    }
}

/// Freehand pen settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PenSettings {
    pub color: String,
    pub width: f32,
}

impl Default for PenSettings {
    fn default() -> Self {
        Self {
            color: "#1f2937".into(),
            width: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub tool: ToolKind,
    pub grid: GridSettings,
    pub lanes: LaneConfig,
    pub edge_defaults: EdgeDefaults,
    pub pen: PenSettings,
    pub route: RouteConfig,
    pub hit: HitConfig,
    /// Space bar held: left drag pans.
    pub space_held: bool,
}

impl SessionState {
    pub fn layout(&self) -> LayoutSettings {
        LayoutSettings {
            swimlanes: self.lanes.clone(),
            grid: self.grid,
        }
    }

    pub fn apply_layout(&mut self, layout: LayoutSettings) {
        let layout = layout.clamped();
        self.lanes = layout.swimlanes;
        self.grid = layout.grid;
    }
}
