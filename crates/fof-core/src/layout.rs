//! Canvas layout settings: swimlanes and the snapping grid.
//!
//! These travel in the `layout` block of the JSON envelope.

use serde::{Deserialize, Serialize};

/// How nodes get their `swimlaneId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneGrouping {
    /// No lanes drawn; `swimlaneId` is left alone.
    #[default]
    Off,
    /// Lane follows the node's y position while it is dragged.
    Manual,
}

impl LaneGrouping {
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Some(Self::Off),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// A labelled lane band. Lane `n` spans `[(n-1)*h, n*h)` in world y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swimlane {
    pub id: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneConfig {
    #[serde(default)]
    pub grouping: LaneGrouping,
    #[serde(default = "default_lane_height")]
    pub lane_height: f32,
    #[serde(default)]
    pub lanes: Vec<Swimlane>,
}

pub const DEFAULT_LANE_HEIGHT: f32 = 200.0;
/// Lanes thinner than this are widened to it.
pub const MIN_LANE_HEIGHT: f32 = 20.0;

/// Usable lane height: non-finite or non-positive falls back to the
/// default, anything else is raised to `MIN_LANE_HEIGHT`.
pub fn clamp_lane_height(h: f32) -> f32 {
    if h.is_finite() && h > 0.0 {
        h.max(MIN_LANE_HEIGHT)
    } else {
        DEFAULT_LANE_HEIGHT
    }
}

fn default_lane_height() -> f32 {
    DEFAULT_LANE_HEIGHT
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            grouping: LaneGrouping::Off,
            lane_height: DEFAULT_LANE_HEIGHT,
            lanes: Vec::new(),
        }
    }
}

impl LaneConfig {
    pub fn effective_height(&self) -> f32 {
        clamp_lane_height(self.lane_height)
    }

    /// 1-based lane containing world y. Negative y belongs to lane 1.
    pub fn lane_for_y(&self, y: f32) -> u32 {
        let lane = (y.max(0.0) / self.effective_height()).floor() as u32;
        lane.saturating_add(1)
    }

    /// Lane to assign after a move, or `None` when lanes are not tracked.
    pub fn assign(&self, y: f32) -> Option<u32> {
        match self.grouping {
            LaneGrouping::Manual => Some(self.lane_for_y(y)),
            LaneGrouping::Off => None,
        }
    }
}

pub const DEFAULT_GRID_SIZE: f32 = 40.0;

/// Background grid and drag snapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSettings {
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub snap: bool,
    #[serde(default = "default_grid_size")]
    pub size: f32,
}

fn default_true() -> bool {
    true
}

fn default_grid_size() -> f32 {
    DEFAULT_GRID_SIZE
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            visible: true,
            snap: true,
            size: DEFAULT_GRID_SIZE,
        }
    }
}

/// Grid sizes at or below zero, or non-finite, fall back to the default.
pub fn clamp_grid_size(size: f32) -> f32 {
    if size.is_finite() && size > 0.0 {
        size
    } else {
        DEFAULT_GRID_SIZE
    }
}

impl GridSettings {
    /// Round a coordinate to the nearest grid line.
    pub fn snap_value(&self, v: f32) -> f32 {
        if self.size <= 0.0 {
            return v;
        }
        (v / self.size).round() * self.size
    }
}

/// Everything in the envelope's `layout` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettings {
    #[serde(default)]
    pub swimlanes: LaneConfig,
    #[serde(default)]
    pub grid: GridSettings,
}

impl LayoutSettings {
    /// Bring numeric settings into their usable ranges.
    pub fn clamped(mut self) -> Self {
        self.swimlanes.lane_height = clamp_lane_height(self.swimlanes.lane_height);
        self.grid.size = clamp_grid_size(self.grid.size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_index_from_y() {
        let cfg = LaneConfig {
            grouping: LaneGrouping::Manual,
            lane_height: 200.0,
            lanes: Vec::new(),
        };
        assert_eq!(cfg.lane_for_y(-50.0), 1);
        assert_eq!(cfg.lane_for_y(0.0), 1);
        assert_eq!(cfg.lane_for_y(199.9), 1);
        assert_eq!(cfg.lane_for_y(200.0), 2);
        assert_eq!(cfg.lane_for_y(850.0), 5);
        assert_eq!(cfg.assign(450.0), Some(3));
    }

    #[test]
    fn degenerate_lane_heights_stay_one_based() {
        let mut cfg = LaneConfig {
            grouping: LaneGrouping::Manual,
            lane_height: 1e-30,
            lanes: Vec::new(),
        };
        // Raised to the minimum height.
        assert_eq!(cfg.lane_for_y(100.0), 6);
        assert_eq!(cfg.lane_for_y(f32::MAX), u32::MAX);

        for h in [0.0, -5.0, f32::NAN, f32::INFINITY] {
            cfg.lane_height = h;
            assert_eq!(cfg.effective_height(), DEFAULT_LANE_HEIGHT);
            assert_eq!(cfg.lane_for_y(450.0), 3);
        }
    }

    #[test]
    fn clamped_layout_fixes_numeric_ranges() {
        let mut layout = LayoutSettings::default();
        layout.swimlanes.lane_height = 0.5;
        layout.grid.size = -10.0;
        let layout = layout.clamped();
        assert_eq!(layout.swimlanes.lane_height, MIN_LANE_HEIGHT);
        assert_eq!(layout.grid.size, DEFAULT_GRID_SIZE);
    }

    #[test]
    fn grouping_from_wire() {
        assert_eq!(LaneGrouping::from_wire("Manual"), Some(LaneGrouping::Manual));
        assert_eq!(LaneGrouping::from_wire("auto"), None);
    }

    #[test]
    fn grid_snaps_to_nearest_multiple() {
        let grid = GridSettings::default();
        assert_eq!(grid.snap_value(59.0), 40.0);
        assert_eq!(grid.snap_value(61.0), 80.0);
        assert_eq!(grid.snap_value(-21.0), -40.0);
    }

    #[test]
    fn off_grouping_assigns_nothing() {
        assert_eq!(LaneConfig::default().assign(450.0), None);
    }
}
